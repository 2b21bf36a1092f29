// firewatch_sim/src/simulation/config/structs.rs

use firewatch_core::config::{ControllerConfig, CoverageConfig, MissionConfig};
use firewatch_core::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

// =========================================================================
// == Top-Level Configuration ==
// =========================================================================

/// # ScenarioConfig
/// Everything a `firewatch run` needs. This is the root of a scenario TOML
/// file; every section is optional and falls back to its defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    pub swarm: SwarmConfig,
    pub bus: BusConfig,
    pub logging: LoggingConfig,
    pub fires: FireInjectorConfig,
    pub mission: MissionConfig,
    pub controller: ControllerConfig,
    pub coverage: CoverageConfig,
}

impl ScenarioConfig {
    pub fn validate(&self) -> CoreResult<()> {
        self.swarm.validate()?;
        self.bus.validate()?;
        self.fires.validate()?;
        self.mission.validate()?;
        self.controller.validate()?;
        self.coverage.validate()?;
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::InvalidConfig(message.into())
}

// =========================================================================
// == Configuration Sub-Structs ==
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SwarmConfig {
    /// Number of agents, `drone_0` .. `drone_{agents-1}`.
    pub agents: usize,
    /// Delay between two agent launches [ms].
    pub launch_stagger_ms: u64,
    /// Step used when the measured tick interval is not positive [s].
    pub fallback_dt: f64,
    /// Ticks between two status log lines. 0 disables them.
    pub status_log_interval: u64,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            agents: 5,
            launch_stagger_ms: 150,
            fallback_dt: 1.0 / 60.0,
            status_log_interval: 120,
        }
    }
}

impl SwarmConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.agents == 0 {
            return Err(invalid("swarm.agents must be at least 1"));
        }
        if !self.fallback_dt.is_finite() || self.fallback_dt <= 0.0 {
            return Err(invalid(format!(
                "swarm.fallback_dt must be positive, got {}",
                self.fallback_dt
            )));
        }
        Ok(())
    }
}

/// Accepted keep-alive periods [s]. The timer cannot run with a zero period.
pub const KEEP_ALIVE_SECS: RangeInclusive<f64> = 0.001..=3600.0;

/// Broker connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BusConfig {
    pub host: String,
    pub port: u16,
    /// The broker forgets clients after 2 s of silence.
    pub keep_alive_secs: f64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4444,
            keep_alive_secs: 1.0,
        }
    }
}

impl BusConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.host.is_empty() {
            return Err(invalid("bus.host must not be empty"));
        }
        if !KEEP_ALIVE_SECS.contains(&self.keep_alive_secs) {
            return Err(invalid(format!(
                "bus.keep_alive_secs must be within {:?}, got {}",
                KEEP_ALIVE_SECS, self.keep_alive_secs
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive. `RUST_LOG` takes precedence.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Built-in fire source for runs without an environment-side fire manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FireInjectorConfig {
    pub enabled: bool,
    /// Optional seed for reproducible fire sequences.
    pub seed: Option<u64>,
    /// Mean of the exponential inter-arrival time [s].
    pub mean_interval_secs: f64,
}

impl Default for FireInjectorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            seed: None,
            mean_interval_secs: 30.0,
        }
    }
}

impl FireInjectorConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if !self.mean_interval_secs.is_finite() || self.mean_interval_secs <= 0.0 {
            return Err(invalid(format!(
                "fires.mean_interval_secs must be positive, got {}",
                self.mean_interval_secs
            )));
        }
        Ok(())
    }
}
