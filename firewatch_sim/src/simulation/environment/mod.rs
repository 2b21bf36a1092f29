// firewatch_sim/src/simulation/environment/mod.rs

pub mod fire_injector;

pub use fire_injector::FireInjector;
