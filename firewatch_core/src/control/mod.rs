// firewatch_core/src/control/mod.rs

pub mod flight;
pub mod stages;
