// firewatch_sim/src/simulation/bus/local.rs

use tokio::sync::watch;
use tracing::trace;

use crate::simulation::bus::{Bus, TopicTable, Value};
use crate::simulation::core::error::SimResult;

/// In-process loopback bus. Every publish is immediately visible to every
/// reader, and publishing to a new key registers it.
#[derive(Debug, Default)]
pub struct LocalBus {
    table: TopicTable,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Bus for LocalBus {
    fn subscribe(&self, keys: &[String]) -> SimResult<()> {
        for key in keys {
            self.table.register(key);
        }
        Ok(())
    }

    fn publish(&self, key: &str, value: Value) {
        trace!(key, ?value, "publish");
        self.table.register(key);
        self.table.update(key, value.as_f64());
    }

    fn read(&self, key: &str) -> Option<f64> {
        self.table.read(key)
    }

    fn watch(&self, key: &str) -> SimResult<watch::Receiver<Option<f64>>> {
        self.table.watch(key)
    }
}
