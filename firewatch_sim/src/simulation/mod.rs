// firewatch_sim/src/simulation/mod.rs

pub mod agents;
pub mod bus;
pub mod config;
pub mod core;
pub mod environment;
