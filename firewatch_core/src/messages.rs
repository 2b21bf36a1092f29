// firewatch_core/src/messages.rs

use nalgebra::Vector3;
use std::collections::BTreeMap;

use crate::agent::state::{AgentState, PeerStatus};
use crate::types::{AgentId, FireId, FlightTargets};

// =========================================================================
// == Swarm Snapshot ==
// =========================================================================

/// What one peer last broadcast about itself.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PeerRecord {
    /// Raw numeric state code, see [`AgentState::status_code`].
    pub status_code: f64,
    pub position: Vector3<f64>,
    /// All zeros when the peer holds no claim.
    pub claimed_fire: Vector3<f64>,
}

impl PeerRecord {
    pub fn status(&self) -> PeerStatus {
        PeerStatus::from_code(self.status_code)
    }
}

/// A possibly-stale, read-only view of every peer's broadcast state.
///
/// Built wholesale once per tick and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeerSnapshot {
    peers: BTreeMap<AgentId, PeerRecord>,
}

impl PeerSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn get(&self, id: AgentId) -> Option<&PeerRecord> {
        self.peers.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AgentId, &PeerRecord)> {
        self.peers.iter()
    }
}

impl FromIterator<(AgentId, PeerRecord)> for PeerSnapshot {
    fn from_iter<I: IntoIterator<Item = (AgentId, PeerRecord)>>(iter: I) -> Self {
        Self {
            peers: iter.into_iter().collect(),
        }
    }
}

// =========================================================================
// == Fire Events ==
// =========================================================================

/// A fire reported by the environment. Agents observe it, never own it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireEvent {
    pub id: FireId,
    pub position: Vector3<f64>,
}

/// The global fire channels as seen this tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FireFeed {
    /// Most recently announced event, if any.
    pub latest: Option<FireEvent>,
    /// Most recently resolved event id, if any.
    pub resolved: Option<FireId>,
}

impl FireFeed {
    /// The latest event, unless it has already been resolved.
    pub fn unresolved(&self) -> Option<FireEvent> {
        self.latest.filter(|fire| Some(fire.id) != self.resolved)
    }

    pub fn is_resolved(&self, id: FireId) -> bool {
        self.resolved == Some(id)
    }
}

// =========================================================================
// == Per-Tick Output ==
// =========================================================================

/// What an agent tells its peers about itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentBroadcast {
    pub state: AgentState,
    pub position: Vector3<f64>,
    pub claimed_fire: Option<Vector3<f64>>,
}

impl AgentBroadcast {
    pub fn status_code(&self) -> f64 {
        self.state.status_code()
    }

    /// The claimed fire position, zeroed when no claim is held.
    pub fn claimed_fire_or_zero(&self) -> Vector3<f64> {
        self.claimed_fire.unwrap_or_else(Vector3::zeros)
    }
}

/// Everything an agent produces in one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutput {
    /// Motor thrusts `[f1, f2, f3, f4]`: front-right, front-left, rear-left, rear-right.
    pub thrusts: [f64; 4],
    pub broadcast: AgentBroadcast,
    /// Set on the tick a suppression completes.
    pub resolved_fire: Option<FireId>,
    pub targets: FlightTargets,
}
