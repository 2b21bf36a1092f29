// firewatch_sim/src/simulation/agents/swarm.rs

use std::sync::Arc;
use std::time::Duration;

use firewatch_core::agent::Agent;
use firewatch_core::error::CoreError;
use firewatch_core::types::AgentId;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, Instrument};

use crate::simulation::agents::runner::AgentRunner;
use crate::simulation::bus::Bus;
use crate::simulation::config::structs::ScenarioConfig;
use crate::simulation::core::error::SimResult;

/// Running agent tasks plus the signal that stops them.
pub struct SwarmHandle {
    shutdown: watch::Sender<bool>,
    tasks: Vec<(AgentId, JoinHandle<SimResult<()>>)>,
}

impl SwarmHandle {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// A receiver for the swarm's stop signal, for tasks that should stop
    /// together with the agents.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Signals every agent to stop at its next tick boundary and joins them.
    /// Returns the first error any agent ended with.
    pub async fn shutdown(self) -> SimResult<()> {
        self.shutdown.send_replace(true);

        let mut first_error = None;
        for (id, task) in self.tasks {
            let outcome = match task.await {
                Ok(result) => result,
                Err(e) => Err(e.into()),
            };
            if let Err(e) = outcome {
                error!(agent = %id, error = %e, "agent ended with an error");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Builds every agent from `config` and spawns one task per agent, staggered
/// by `launch_stagger_ms`.
///
/// `buses[i]` is the bus client of agent `i`. Do not share one broker client
/// between agents: a publish is not guaranteed to come back to its sender,
/// so agents on one socket might never see each other.
pub async fn launch(config: &ScenarioConfig, buses: Vec<Arc<dyn Bus>>) -> SimResult<SwarmHandle> {
    let count = config.swarm.agents;
    let stagger = Duration::from_millis(config.swarm.launch_stagger_ms);

    if buses.len() != count {
        return Err(CoreError::InvalidConfig(format!(
            "{} bus clients for a swarm of {count}",
            buses.len()
        ))
        .into());
    }

    // Build all agents first so a configuration error spawns nothing.
    let agents = (0..count)
        .map(|index| {
            Agent::for_swarm(
                index,
                count,
                config.mission.clone(),
                &config.controller,
                &config.coverage,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    let (shutdown, _) = watch::channel(false);
    let mut tasks = Vec::with_capacity(count);
    for (index, (agent, bus)) in agents.into_iter().zip(buses).enumerate() {
        if index > 0 && !stagger.is_zero() {
            tokio::time::sleep(stagger).await;
        }
        let id = agent.id();
        let runner = AgentRunner::new(agent, count, bus, &config.swarm);
        let span = info_span!("agent", id = id.0);
        let task = tokio::spawn(runner.run(shutdown.subscribe()).instrument(span));
        tasks.push((id, task));
    }

    info!(agents = count, "swarm launched");
    Ok(SwarmHandle { shutdown, tasks })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::bus::LocalBus;
    use crate::simulation::core::error::SimError;

    fn shared_local_bus(count: usize) -> Vec<Arc<dyn Bus>> {
        let bus: Arc<dyn Bus> = Arc::new(LocalBus::new());
        vec![bus; count]
    }

    #[tokio::test]
    async fn test_launch_and_shutdown_idle_swarm() {
        let mut config = ScenarioConfig::default();
        config.swarm.agents = 3;
        config.swarm.launch_stagger_ms = 0;

        let swarm = launch(&config, shared_local_bus(3)).await.unwrap();
        assert_eq!(swarm.len(), 3);

        // Nobody ever sends the readiness flag; shutdown must still return.
        tokio::time::timeout(Duration::from_secs(1), swarm.shutdown())
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_invalid_coverage_spawns_nothing() {
        let mut config = ScenarioConfig::default();
        config.coverage.row_spacing = 0.0;
        let count = config.swarm.agents;
        assert!(launch(&config, shared_local_bus(count)).await.is_err());
    }

    #[tokio::test]
    async fn test_every_agent_needs_its_own_bus_client() {
        let mut config = ScenarioConfig::default();
        config.swarm.agents = 3;
        config.swarm.launch_stagger_ms = 0;

        let err = launch(&config, shared_local_bus(1)).await.err().unwrap();
        assert!(matches!(err, SimError::Core(CoreError::InvalidConfig(_))));
    }
}
