// firewatch_sim/src/simulation/environment/fire_injector.rs

//! Stand-in fire source for runs where the environment does not spawn fires
//! itself.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use firewatch_core::config::CoverageConfig;
use firewatch_core::error::CoreError;
use firewatch_core::messages::FireEvent;
use firewatch_core::types::FireId;
use nalgebra::Vector3;
use rand::Rng;
use rand_distr::{Distribution, Exp};
use tokio::sync::watch;
use tracing::info;

use crate::simulation::bus::{Bus, Value};
use crate::simulation::config::structs::FireInjectorConfig;
use crate::simulation::core::error::SimResult;
use crate::simulation::core::frames::controller_to_env;
use crate::simulation::core::prng::SimulationRng;
use crate::simulation::core::topics::world;

pub struct FireInjector {
    rng: SimulationRng,
    interarrival: Exp<f64>,
    area_size: f64,
    next_id: NonZeroU32,
    bus: Arc<dyn Bus>,
}

impl FireInjector {
    pub fn new(
        config: &FireInjectorConfig,
        coverage: &CoverageConfig,
        bus: Arc<dyn Bus>,
    ) -> SimResult<Self> {
        let interarrival = Exp::new(1.0 / config.mean_interval_secs)
            .map_err(|e| CoreError::InvalidConfig(format!("fires.mean_interval_secs: {e}")))?;
        Ok(Self {
            rng: SimulationRng::new(config.seed),
            interarrival,
            area_size: coverage.area_size,
            next_id: NonZeroU32::MIN,
            bus,
        })
    }

    /// Time until the next fire.
    pub fn next_delay(&mut self) -> Duration {
        Duration::from_secs_f64(self.interarrival.sample(&mut self.rng.0))
    }

    /// Starts a fire at a uniformly random ground position and announces it.
    /// The position is published before the id.
    pub fn ignite(&mut self) -> FireEvent {
        let id = FireId::from(self.next_id);
        self.next_id = self.next_id.saturating_add(1);

        let position = Vector3::new(
            self.rng.0.gen_range(0.0..self.area_size),
            self.rng.0.gen_range(0.0..self.area_size),
            0.0,
        );
        let env = controller_to_env(&position);
        self.bus.publish(world::FIRE_X, Value::Float(env.x as f32));
        self.bus.publish(world::FIRE_Y, Value::Float(env.y as f32));
        self.bus.publish(world::FIRE_Z, Value::Float(env.z as f32));
        self.bus.publish(world::FIRE_NEW, Value::Float(id.raw() as f32));

        info!(fire = %id, x = position.x, y = position.y, "fire started");
        FireEvent { id, position }
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            let delay = self.next_delay();
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    self.ignite();
                }
                _ = shutdown.changed() => break,
            }
        }
    }
}
