// firewatch_core/src/agent/allocation.rs

//! Decentralised fire allocation.
//!
//! Every agent evaluates the same rule against its own snapshot of the swarm
//! and claims the fire only if it looks like the best-placed free responder.
//! Snapshots are stale and unordered, so two agents can both accept within
//! the same broadcast window. That duplicate response is tolerated; this is
//! a heuristic, not a consensus protocol.

use nalgebra::Vector3;

use crate::agent::state::{AgentState, PeerStatus};
use crate::config::MissionConfig;
use crate::messages::PeerSnapshot;

/// Outcome of one evaluation, kept explicit for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    /// The agent is busy (not exploring or returning).
    NotFree(AgentState),
    /// Enough peers are already flying towards this fire.
    QuotaFilled { responding: usize },
    /// Enough free peers are closer than this agent.
    CloserPeers { closer: usize, responding: usize },
}

impl Verdict {
    pub fn is_accept(self) -> bool {
        self == Verdict::Accept
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocationRule {
    /// A moving peer whose claim lies within this radius counts as a responder.
    pub responder_radius: f64,
    /// Subtracted from the own distance before comparing with free peers.
    pub hysteresis: f64,
    /// Responders wanted per fire.
    pub quota: usize,
}

impl From<&MissionConfig> for AllocationRule {
    fn from(mission: &MissionConfig) -> Self {
        Self {
            responder_radius: mission.responder_radius,
            hysteresis: mission.hysteresis,
            quota: mission.responder_quota,
        }
    }
}

impl AllocationRule {
    /// Decides whether an agent in `own_state` at `own_position` should claim
    /// the fire at `fire_position`.
    pub fn evaluate(
        &self,
        own_state: AgentState,
        own_position: &Vector3<f64>,
        fire_position: &Vector3<f64>,
        peers: &PeerSnapshot,
    ) -> Verdict {
        if !own_state.is_free() {
            return Verdict::NotFree(own_state);
        }

        let own_distance = (own_position - fire_position).norm();

        let mut responding = 0;
        let mut closer = 0;
        for (_, peer) in peers.iter() {
            match peer.status() {
                PeerStatus::Responding => {
                    if (peer.claimed_fire - fire_position).norm() < self.responder_radius {
                        responding += 1;
                    }
                }
                PeerStatus::Free => {
                    if (peer.position - fire_position).norm() < own_distance - self.hysteresis {
                        closer += 1;
                    }
                }
                PeerStatus::Unavailable => {}
            }
        }

        if responding >= self.quota {
            return Verdict::QuotaFilled { responding };
        }
        if closer >= self.quota - responding {
            return Verdict::CloserPeers { closer, responding };
        }
        Verdict::Accept
    }
}
