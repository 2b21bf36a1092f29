// firewatch_sim/src/simulation/agents/runner.rs

//! Drives one [`Agent`] from the bus: one tick of the agent per tick pulse
//! published by the environment.

use std::sync::Arc;

use firewatch_core::agent::Agent;
use firewatch_core::messages::{FireEvent, FireFeed, PeerRecord, PeerSnapshot, TickOutput};
use firewatch_core::types::{AgentId, FireId, TelemetrySample};
use nalgebra::Vector3;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::simulation::bus::{Bus, Value};
use crate::simulation::config::structs::SwarmConfig;
use crate::simulation::core::clock::TickClock;
use crate::simulation::core::error::{SimError, SimResult};
use crate::simulation::core::frames::{controller_to_env, env_to_controller, telemetry_from_env};
use crate::simulation::core::topics::{self, world, AgentTopics};

pub struct AgentRunner {
    agent: Agent,
    bus: Arc<dyn Bus>,
    topics: AgentTopics,
    peers: Vec<AgentTopics>,
    clock: TickClock,
    status_log_interval: u64,
    ticks: u64,
}

impl AgentRunner {
    /// `swarm_size` determines which peers are read each tick.
    pub fn new(agent: Agent, swarm_size: usize, bus: Arc<dyn Bus>, swarm: &SwarmConfig) -> Self {
        let id = agent.id();
        let peers = (0..swarm_size)
            .map(AgentId)
            .filter(|peer| *peer != id)
            .map(AgentTopics::new)
            .collect();
        Self {
            agent,
            bus,
            topics: AgentTopics::new(id),
            peers,
            clock: TickClock::new(swarm.fallback_dt),
            status_log_interval: swarm.status_log_interval,
            ticks: 0,
        }
    }

    /// Runs until `shutdown` flips to `true` (or its sender is dropped).
    ///
    /// Waits for the readiness flag, engages the agent, then steps it once per
    /// tick pulse.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> SimResult<()> {
        self.bus
            .subscribe(&topics::subscriptions(&self.topics, &self.peers))?;
        let mut connected = self.bus.watch(&self.topics.connected)?;
        let mut tick = self.bus.watch(&self.topics.tick)?;

        while connected.borrow_and_update().is_none() {
            if *shutdown.borrow() {
                return Ok(());
            }
            tokio::select! {
                changed = connected.changed() => changed.map_err(|_| SimError::BusClosed)?,
                _ = shutdown.changed() => return Ok(()),
            }
        }
        info!("environment ready, taking off");
        self.agent.engage();

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                changed = tick.changed() => changed.map_err(|_| SimError::BusClosed)?,
                _ = shutdown.changed() => break,
            }
            let dt = self.clock.tick();
            self.tick_once(dt);
        }

        info!(ticks = self.ticks, state = %self.agent.state(), "agent stopped");
        Ok(())
    }

    /// One read -> step -> publish cycle.
    pub fn tick_once(&mut self, dt: f64) -> TickOutput {
        let telemetry = self.read_telemetry();
        let peers = self.read_peers();
        let fires = self.read_fires();

        let output = self.agent.step(dt, &telemetry, &peers, &fires);
        self.publish(&output);

        self.ticks += 1;
        if self.status_log_interval > 0 && self.ticks % self.status_log_interval == 0 {
            self.log_status(dt, &telemetry);
        }
        output
    }

    /// Missing values read as zero, the same as a genuine zero reading.
    fn value(&self, key: &str) -> f64 {
        self.bus.read(key).unwrap_or(0.0)
    }

    fn vector(&self, keys: &[String; 3]) -> Vector3<f64> {
        Vector3::new(self.value(&keys[0]), self.value(&keys[1]), self.value(&keys[2]))
    }

    fn read_telemetry(&self) -> TelemetrySample {
        let raw = std::array::from_fn(|i| self.value(&self.topics.telemetry[i]));
        telemetry_from_env(&raw)
    }

    fn read_peers(&self) -> PeerSnapshot {
        self.peers
            .iter()
            .map(|peer| {
                let record = PeerRecord {
                    status_code: self.value(&peer.status),
                    position: env_to_controller(&self.vector(&peer.position)),
                    claimed_fire: env_to_controller(&self.vector(&peer.fire)),
                };
                (peer.id, record)
            })
            .collect()
    }

    fn read_fires(&self) -> FireFeed {
        let latest = FireId::from_raw(self.value(world::FIRE_NEW)).map(|id| {
            let position = Vector3::new(
                self.value(world::FIRE_X),
                self.value(world::FIRE_Y),
                self.value(world::FIRE_Z),
            );
            FireEvent {
                id,
                position: env_to_controller(&position),
            }
        });
        FireFeed {
            latest,
            resolved: FireId::from_raw(self.value(world::FIRE_RESOLVED)),
        }
    }

    fn publish(&self, output: &TickOutput) {
        for (key, thrust) in self.topics.thrusts.iter().zip(output.thrusts) {
            self.bus.publish(key, Value::Float(thrust as f32));
        }

        let broadcast = &output.broadcast;
        self.bus
            .publish(&self.topics.status, Value::Float(broadcast.status_code() as f32));
        self.publish_vector(&self.topics.position, &controller_to_env(&broadcast.position));
        self.publish_vector(
            &self.topics.fire,
            &controller_to_env(&broadcast.claimed_fire_or_zero()),
        );

        // Environment X is controller x, environment Z is controller y.
        self.bus
            .publish(&self.topics.target_x, Value::Float(output.targets.x as f32));
        self.bus
            .publish(&self.topics.target_z, Value::Float(output.targets.y as f32));

        if let Some(id) = output.resolved_fire {
            info!(fire = %id, "publishing resolution");
            self.bus
                .publish(world::FIRE_RESOLVED, Value::Float(id.raw() as f32));
        }
    }

    fn publish_vector(&self, keys: &[String; 3], v: &Vector3<f64>) {
        for (key, component) in keys.iter().zip(v.iter()) {
            self.bus.publish(key, Value::Float(*component as f32));
        }
    }

    fn log_status(&self, dt: f64, telemetry: &TelemetrySample) {
        let targets = self.agent.controller().targets();
        let trace = self.agent.controller().trace();
        debug!(
            state = %self.agent.state(),
            x = telemetry.position.x,
            y = telemetry.position.y,
            z = telemetry.position.z,
            roll = telemetry.attitude.roll,
            pitch = telemetry.attitude.pitch,
            target_x = targets.x,
            target_y = targets.y,
            target_z = targets.z,
            vz_target = trace.vz_target,
            dt_ms = dt * 1000.0,
            "status"
        );
    }
}
