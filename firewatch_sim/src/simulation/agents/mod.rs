// firewatch_sim/src/simulation/agents/mod.rs

pub mod runner;
pub mod swarm;

pub use runner::AgentRunner;
pub use swarm::{launch, SwarmHandle};
