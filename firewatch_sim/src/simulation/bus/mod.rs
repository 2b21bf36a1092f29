// firewatch_sim/src/simulation/bus/mod.rs

//! The publish/subscribe key-value bus that connects agents, peers and the
//! environment.

pub mod codec;
pub mod dds;
pub mod local;

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tokio::sync::watch;

use crate::simulation::core::error::{SimError, SimResult};

pub use dds::DdsBus;
pub use local::LocalBus;

/// A numeric bus value with an explicit wire type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
}

impl Value {
    pub fn as_f64(self) -> f64 {
        match self {
            Value::Int(v) => v as f64,
            Value::Float(v) => v as f64,
        }
    }
}

/// Contract shared by every transport.
///
/// `publish` is fire-and-forget: failures are logged by the implementation
/// and never reported to the caller.
pub trait Bus: Send + Sync {
    /// Registers interest in `keys`. Values for unregistered keys are dropped.
    fn subscribe(&self, keys: &[String]) -> SimResult<()>;

    fn publish(&self, key: &str, value: Value);

    /// Latest value received for `key`, if any. Never blocks.
    fn read(&self, key: &str) -> Option<f64>;

    /// Change notifications for a subscribed key.
    fn watch(&self, key: &str) -> SimResult<watch::Receiver<Option<f64>>>;
}

/// Latest-value store with change notification, one watch channel per key.
#[derive(Debug, Default)]
pub struct TopicTable {
    channels: RwLock<HashMap<String, watch::Sender<Option<f64>>>>,
}

impl TopicTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `key` if missing. Existing values are kept.
    pub fn register(&self, key: &str) {
        let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
        if !channels.contains_key(key) {
            let (tx, _) = watch::channel(None);
            channels.insert(key.to_string(), tx);
        }
    }

    pub fn is_registered(&self, key: &str) -> bool {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Stores `value` and wakes every watcher, even if the value is unchanged.
    /// Returns `false` when the key is not registered.
    pub fn update(&self, key: &str, value: f64) -> bool {
        let channels = self.channels.read().unwrap_or_else(PoisonError::into_inner);
        match channels.get(key) {
            Some(tx) => {
                tx.send_replace(Some(value));
                true
            }
            None => false,
        }
    }

    pub fn read(&self, key: &str) -> Option<f64> {
        let channels = self.channels.read().unwrap_or_else(PoisonError::into_inner);
        channels.get(key).and_then(|tx| *tx.borrow())
    }

    pub fn watch(&self, key: &str) -> SimResult<watch::Receiver<Option<f64>>> {
        let channels = self.channels.read().unwrap_or_else(PoisonError::into_inner);
        channels
            .get(key)
            .map(watch::Sender::subscribe)
            .ok_or_else(|| SimError::UnknownKey(key.to_string()))
    }

    pub fn len(&self) -> usize {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unregistered_keys_are_dropped() {
        let table = TopicTable::new();
        assert!(!table.update("drone_0/X", 1.0));
        assert_eq!(table.read("drone_0/X"), None);
        assert!(matches!(table.watch("drone_0/X"), Err(SimError::UnknownKey(_))));
    }

    #[test]
    fn test_register_keeps_existing_value() {
        let table = TopicTable::new();
        table.register("world/fire_new");
        assert_eq!(table.read("world/fire_new"), None);
        assert!(table.update("world/fire_new", 3.0));
        table.register("world/fire_new");
        assert_eq!(table.read("world/fire_new"), Some(3.0));
        assert_eq!(table.len(), 1);
    }

    #[tokio::test]
    async fn test_watch_wakes_on_repeated_value() {
        let table = TopicTable::new();
        table.register("drone_0/tick");
        let mut rx = table.watch("drone_0/tick").unwrap();

        table.update("drone_0/tick", 1.0);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Some(1.0));

        table.update("drone_0/tick", 1.0);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Some(1.0));
    }

    #[test]
    fn test_value_widening() {
        assert_eq!(Value::Int(-2).as_f64(), -2.0);
        assert_eq!(Value::Float(0.5).as_f64(), 0.5);
    }
}
