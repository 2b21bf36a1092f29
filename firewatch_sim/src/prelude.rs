// firewatch_sim/src/prelude.rs

// Re-export the entire firewatch_core prelude so host code can reach pure
// types like `Agent`, `TelemetrySample` or `FireId` directly.
pub use firewatch_core::prelude::*;

// Host-side types.
pub use crate::simulation::agents::{launch, AgentRunner, SwarmHandle};
pub use crate::simulation::bus::{Bus, DdsBus, LocalBus, Value};
pub use crate::simulation::config::structs::*;
pub use crate::simulation::core::error::{SimError, SimResult};
pub use crate::simulation::core::topics::{world, AgentTopics};
pub use crate::simulation::environment::FireInjector;
