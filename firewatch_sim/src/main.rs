// firewatch_sim/src/main.rs

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use firewatch_sim::cli::{Cli, Command, ConfigArgs, RunArgs};
use firewatch_sim::prelude::*;
use firewatch_sim::simulation::config::{load_scenario, render};
use firewatch_sim::simulation::core::logging;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Run(args) => run(args).await,
        Command::Config(args) => print_config(args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "firewatch failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: RunArgs) -> SimResult<()> {
    let mut config = load_scenario(args.scenario.as_deref())?;
    args.apply(&mut config);
    config.validate()?;
    logging::init(&config.logging)?;

    info!(
        agents = config.swarm.agents,
        broker = %format!("{}:{}", config.bus.host, config.bus.port),
        fires = config.fires.enabled,
        "starting swarm"
    );

    // One broker client per agent, as each drone is its own peer on the bus.
    let mut clients = Vec::with_capacity(config.swarm.agents);
    for _ in 0..config.swarm.agents {
        clients.push(Arc::new(DdsBus::connect(&config.bus).await?));
    }
    let buses = clients
        .iter()
        .map(|client| Arc::clone(client) as Arc<dyn Bus>)
        .collect();
    let swarm = launch(&config, buses).await?;

    let injector = if config.fires.enabled {
        let client = Arc::new(DdsBus::connect(&config.bus).await?);
        let injector = FireInjector::new(&config.fires, &config.coverage, client.clone())?;
        clients.push(client);
        Some(tokio::spawn(injector.run(swarm.shutdown_signal())))
    } else {
        None
    };

    tokio::signal::ctrl_c().await?;
    info!("interrupt received, stopping");

    let stopped = swarm.shutdown().await;
    if let Some(injector) = injector {
        injector.await?;
    }
    for client in &clients {
        client.close().await?;
    }
    stopped
}

fn print_config(args: ConfigArgs) -> SimResult<()> {
    let config = load_scenario(args.scenario.as_deref())?;
    print!("{}", render(&config)?);
    Ok(())
}
