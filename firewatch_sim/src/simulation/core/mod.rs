// firewatch_sim/src/simulation/core/mod.rs

pub mod clock;
pub mod error;
pub mod frames;
pub mod logging;
pub mod prng;
pub mod topics;
