// firewatch_core/src/lib.rs

// Pure mission and control logic. No I/O lives in this crate.
pub mod agent;
pub mod config;
pub mod control;
pub mod error;
pub mod messages;
pub mod planning;
pub mod prelude;
pub mod types;
