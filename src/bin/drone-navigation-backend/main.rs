use std::io::{self, BufRead};

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::{debug, error, info, warn};
use tether_agent::TetherAgentOptionsBuilder;

use tether_drone_navigation::actuation::{Actuator, LoggingActuator};
use tether_drone_navigation::backend_config::load_config_from_file;
use tether_drone_navigation::systems::Systems;
use tether_drone_navigation::tether_interface::TetherActuator;
use tether_drone_navigation::tracking::parse_detection_frame;

mod cli;

use cli::Cli;

enum Transport {
    DryRun(LoggingActuator),
    Tether(TetherActuator),
}

impl Transport {
    fn actuator(&mut self) -> &mut dyn Actuator {
        match self {
            Transport::DryRun(a) => a,
            Transport::Tether(a) => a,
        }
    }

    fn publish_tracked(&self, systems: &Systems) -> Result<()> {
        match self {
            Transport::DryRun(_) => Ok(()),
            Transport::Tether(a) => a.publish_tracked_identities(&systems.tracked_identities()),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level))
        .filter_module("paho_mqtt", log::LevelFilter::Warn)
        .filter_module("tether_agent", log::LevelFilter::Warn)
        .init();

    debug!("Started; args: {:?}", cli);

    let config = load_config_from_file(&cli.config_path)?;
    if config.drones.is_empty() {
        warn!("No drones configured; detections will be ignored");
    }
    let mut systems = Systems::new(&config)?;

    let mut transport = if cli.dry_run {
        warn!("Dry run: commands will only be logged");
        Transport::DryRun(LoggingActuator)
    } else {
        let tether_agent = TetherAgentOptionsBuilder::new(&cli.agent_role)
            .id(Some(&cli.agent_group))
            .host(Some(&cli.tether_host.to_string()))
            .username(cli.tether_username.as_deref())
            .password(cli.tether_password.as_deref())
            .build()?;
        let actuator = TetherActuator::new(tether_agent)?;
        actuator.publish_config(&config)?;
        Transport::Tether(actuator)
    };

    systems.begin_flight(transport.actuator())?;
    info!("{} drone(s) taking off", systems.drones.len());

    if let Err(e) = run(&mut systems, &mut transport) {
        error!("Stopping after failure: {}", e);
        if let Err(land_error) = systems.end_flight(transport.actuator()) {
            error!("Landing also failed: {}", land_error);
        }
        return Err(e);
    }

    info!("End of detection input; landing");
    systems.end_flight(transport.actuator())
}

/// One tick per line of detections, until stdin closes
fn run(systems: &mut Systems, transport: &mut Transport) -> Result<()> {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let candidates = match parse_detection_frame(&line) {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("{}; skipping frame", e);
                continue;
            }
        };

        let decisions = systems.tick(&candidates, transport.actuator())?;
        debug!("Decisions: {:?}", decisions);

        transport.publish_tracked(systems)?;
    }
    Ok(())
}
