// firewatch_sim/src/simulation/config/mod.rs

//! Loads the scenario configuration.
//!
//! Sources are layered with figment, later ones winning: built-in defaults,
//! the scenario TOML file, then `FIREWATCH_*` environment variables (nested
//! keys separated by `__`, e.g. `FIREWATCH_SWARM__AGENTS=3`). Command-line
//! overrides are applied on top by the binary.

pub mod structs;

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use tracing::debug;

use crate::simulation::core::error::SimResult;
pub use structs::{BusConfig, FireInjectorConfig, LoggingConfig, ScenarioConfig, SwarmConfig};

pub const ENV_PREFIX: &str = "FIREWATCH_";

/// The layered provider chain without extracting it.
pub fn scenario_figment(path: Option<&Path>) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(ScenarioConfig::default()));
    if let Some(path) = path {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Extracts and validates a configuration.
pub fn extract(figment: &Figment) -> SimResult<ScenarioConfig> {
    let config: ScenarioConfig = figment.extract()?;
    config.validate()?;
    Ok(config)
}

pub fn load_scenario(path: Option<&Path>) -> SimResult<ScenarioConfig> {
    if let Some(path) = path {
        debug!(path = %path.display(), "loading scenario");
    }
    extract(&scenario_figment(path))
}

/// Renders a configuration back to TOML.
pub fn render(config: &ScenarioConfig) -> SimResult<String> {
    Ok(toml::to_string_pretty(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::core::error::SimError;
    use approx::assert_abs_diff_eq;

    fn from_toml(text: &str) -> SimResult<ScenarioConfig> {
        extract(&Figment::from(Serialized::defaults(ScenarioConfig::default())).merge(Toml::string(text)))
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = from_toml("").unwrap();
        assert_eq!(config, ScenarioConfig::default());
        assert_eq!(config.swarm.agents, 5);
        assert_eq!(config.bus.port, 4444);
        assert_abs_diff_eq!(config.controller.hover_feed_forward, 3.59);
        assert_abs_diff_eq!(config.mission.cruise_altitude, 8.0);
    }

    #[test]
    fn test_partial_sections_merge_over_defaults() {
        let config = from_toml(
            r#"
            [swarm]
            agents = 3

            [mission]
            suppress_secs = 8.0

            [controller.altitude]
            kp = 1.5
            saturation = 3.0
            "#,
        )
        .unwrap();
        assert_eq!(config.swarm.agents, 3);
        assert_eq!(config.swarm.launch_stagger_ms, 150);
        assert_abs_diff_eq!(config.mission.suppress_secs, 8.0);
        assert_abs_diff_eq!(config.mission.fire_radius, 2.5);
        assert_abs_diff_eq!(config.controller.altitude.kp, 1.5);
        assert_eq!(config.controller.altitude.saturation, Some(3.0));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result = from_toml("[swarm]\nagentz = 3\n");
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let result = from_toml("[swarm]\nagents = 0\n");
        assert!(matches!(result, Err(SimError::Core(_))));

        let result = from_toml("[bus]\nkeep_alive_secs = 0.0\n");
        assert!(matches!(result, Err(SimError::Core(_))));
    }

    #[test]
    fn test_render_round_trips() {
        let mut config = ScenarioConfig::default();
        config.fires.enabled = true;
        config.fires.seed = Some(7);
        let text = render(&config).unwrap();
        assert_eq!(from_toml(&text).unwrap(), config);
    }
}
