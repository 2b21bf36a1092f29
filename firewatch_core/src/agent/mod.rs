// firewatch_core/src/agent/mod.rs

pub mod allocation;
pub mod fsm;
pub mod state;

pub use allocation::{AllocationRule, Verdict};
pub use fsm::{Agent, FireClaim};
pub use state::{AgentState, PeerStatus};
