// firewatch_core/src/agent/state.rs

use std::fmt;

/// Discrete task state of one agent. Starts in `Idle`, never terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AgentState {
    #[default]
    Idle,
    Takeoff,
    Hover,
    Explore,
    Move,
    Suppress,
    Return,
}

impl AgentState {
    /// Numeric encoding broadcast to peers.
    ///
    /// `Idle`, `Takeoff` and `Hover` share code 0: peers only need to know the
    /// agent is not available yet.
    pub fn status_code(self) -> f64 {
        match self {
            AgentState::Idle | AgentState::Takeoff | AgentState::Hover => 0.0,
            AgentState::Explore => 1.0,
            AgentState::Move => 2.0,
            AgentState::Return => 3.0,
            AgentState::Suppress => 4.0,
        }
    }

    /// Only patrolling agents may accept a new fire.
    pub fn is_free(self) -> bool {
        matches!(self, AgentState::Explore | AgentState::Return)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AgentState::Idle => "IDLE",
            AgentState::Takeoff => "TAKEOFF",
            AgentState::Hover => "HOVER",
            AgentState::Explore => "EXPLORE",
            AgentState::Move => "MOVE",
            AgentState::Suppress => "SUPPRESS",
            AgentState::Return => "RETURN",
        }
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What can be recovered about a peer from its broadcast code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerStatus {
    /// Exploring or returning.
    Free,
    /// Flying towards a claimed fire.
    Responding,
    /// Anything else, including "not heard from yet".
    Unavailable,
}

impl PeerStatus {
    pub fn from_code(code: f64) -> Self {
        if code == AgentState::Explore.status_code() || code == AgentState::Return.status_code() {
            PeerStatus::Free
        } else if code == AgentState::Move.status_code() {
            PeerStatus::Responding
        } else {
            PeerStatus::Unavailable
        }
    }
}
