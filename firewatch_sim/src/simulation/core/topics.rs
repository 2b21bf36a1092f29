// firewatch_sim/src/simulation/core/topics.rs

//! Bus key naming. Agent keys live under `drone_{i}/`, environment keys
//! under `world/`.

use firewatch_core::types::AgentId;

/// Telemetry channels in the environment's naming, in wire order.
pub const TELEMETRY_CHANNELS: [&str; 12] = [
    "X", "Y", "Z", "VX", "VY", "VZ", "TX", "TY", "TZ", "WX", "WY", "WZ",
];

pub mod world {
    pub const FIRE_NEW: &str = "world/fire_new";
    pub const FIRE_X: &str = "world/fire_x";
    pub const FIRE_Y: &str = "world/fire_y";
    pub const FIRE_Z: &str = "world/fire_z";
    pub const FIRE_RESOLVED: &str = "world/fire_resolved";

    pub const ALL: [&str; 5] = [FIRE_NEW, FIRE_X, FIRE_Y, FIRE_Z, FIRE_RESOLVED];
}

/// Every key of one agent, formatted once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentTopics {
    pub id: AgentId,
    /// Environment -> agent.
    pub telemetry: [String; 12],
    pub tick: String,
    pub connected: String,
    /// Agent -> environment.
    pub thrusts: [String; 4],
    pub target_x: String,
    pub target_z: String,
    /// Agent -> peers.
    pub status: String,
    pub position: [String; 3],
    pub fire: [String; 3],
}

impl AgentTopics {
    pub fn new(id: AgentId) -> Self {
        let key = |channel: &str| format!("drone_{}/{}", id.0, channel);
        Self {
            id,
            telemetry: TELEMETRY_CHANNELS.map(key),
            tick: key("tick"),
            connected: key("connected"),
            thrusts: ["f1", "f2", "f3", "f4"].map(key),
            target_x: key("tgt_x"),
            target_z: key("tgt_z"),
            status: key("status"),
            position: ["sx", "sy", "sz"].map(key),
            fire: ["fire_x", "fire_y", "fire_z"].map(key),
        }
    }

    /// Keys this agent reads about itself.
    pub fn consumed(&self) -> impl Iterator<Item = &String> {
        self.telemetry
            .iter()
            .chain([&self.tick, &self.connected])
    }

    /// Keys peers read about this agent.
    pub fn broadcast(&self) -> impl Iterator<Item = &String> {
        std::iter::once(&self.status)
            .chain(self.position.iter())
            .chain(self.fire.iter())
    }
}

/// Full subscription list of agent `own` in a swarm: its own inputs, every
/// peer's broadcast and the global fire channels.
pub fn subscriptions(own: &AgentTopics, peers: &[AgentTopics]) -> Vec<String> {
    own.consumed()
        .chain(peers.iter().flat_map(|p| p.broadcast()))
        .cloned()
        .chain(world::ALL.iter().map(|k| k.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_key_names() {
        let topics = AgentTopics::new(AgentId(3));
        assert_eq!(topics.telemetry[0], "drone_3/X");
        assert_eq!(topics.telemetry[11], "drone_3/WZ");
        assert_eq!(topics.thrusts[3], "drone_3/f4");
        assert_eq!(topics.position[1], "drone_3/sy");
        assert_eq!(topics.fire[2], "drone_3/fire_z");
        assert_eq!(topics.target_z, "drone_3/tgt_z");
    }

    #[test]
    fn test_subscription_list() {
        let own = AgentTopics::new(AgentId(0));
        let peers = vec![AgentTopics::new(AgentId(1)), AgentTopics::new(AgentId(2))];
        let keys = subscriptions(&own, &peers);
        // 14 own inputs, 7 per peer, 5 global.
        assert_eq!(keys.len(), 14 + 2 * 7 + 5);
        assert!(keys.contains(&"drone_0/tick".to_string()));
        assert!(keys.contains(&"drone_2/fire_x".to_string()));
        assert!(keys.contains(&"world/fire_resolved".to_string()));
        assert!(!keys.contains(&"drone_1/X".to_string()));
    }
}
