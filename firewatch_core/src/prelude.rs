// firewatch_core/src/prelude.rs

// --- Core Abstractions ---
pub use crate::control::stages::ControlStage;
pub use crate::error::{CoreError, CoreResult};

// --- Core Data Structures ---
pub use crate::messages::{
    AgentBroadcast, FireEvent, FireFeed, PeerRecord, PeerSnapshot, TickOutput,
};
pub use crate::types::{AgentId, Euler, FireId, FlightTargets, TelemetrySample};

// --- Configuration ---
pub use crate::config::{ControllerConfig, CoverageConfig, MissionConfig, StageGains};

// --- Mission Logic ---
pub use crate::agent::{Agent, AgentState, AllocationRule, PeerStatus, Verdict};
pub use crate::control::flight::{ControlMode, FlightController};
pub use crate::control::stages::{PController, PiController, PidController};
pub use crate::planning::CoveragePlanner;
