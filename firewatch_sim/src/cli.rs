// firewatch_sim/src/cli.rs

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::simulation::config::structs::ScenarioConfig;

/// Firewatch: a decentralised fire-patrol swarm controller.
///
/// Connects one controller per drone to the simulation environment's broker.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the swarm until Ctrl-C.
    Run(RunArgs),
    /// Print the fully resolved configuration as TOML.
    Config(ConfigArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// The path to the scenario TOML file to run.
    #[arg(short, long)]
    pub scenario: Option<PathBuf>,

    /// Number of agents.
    #[arg(short, long)]
    pub agents: Option<usize>,

    /// Broker host.
    #[arg(long)]
    pub host: Option<String>,

    /// Broker UDP port.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Start the built-in fire injector.
    #[arg(long, default_value_t = false)]
    pub inject_fires: bool,

    /// Log filter, e.g. `debug` or `firewatch_core=debug,info`.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long, default_value_t = false)]
    pub json_logs: bool,
}

impl RunArgs {
    /// Applies the flags that were given on top of the loaded configuration.
    pub fn apply(&self, config: &mut ScenarioConfig) {
        if let Some(agents) = self.agents {
            config.swarm.agents = agents;
        }
        if let Some(host) = &self.host {
            config.bus.host = host.clone();
        }
        if let Some(port) = self.port {
            config.bus.port = port;
        }
        if self.inject_fires {
            config.fires.enabled = true;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.json_logs {
            config.logging.json = true;
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// The path to the scenario TOML file to resolve.
    #[arg(short, long)]
    pub scenario: Option<PathBuf>,
}
