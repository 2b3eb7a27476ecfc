use anyhow::Result;
use log::debug;
use tether_agent::{ChannelDefinition, ChannelOptionsBuilder, TetherAgent};

use crate::{
    actuation::Actuator,
    backend_config::BackendConfig,
    tracking::{
        FlightLifecycle, FlightLifecycleMessage, RcCommand, RcControlMessage, TrackedIdentity,
    },
};

pub struct Outputs {
    pub config_output: ChannelDefinition,
    pub rc_control_output: ChannelDefinition,
    pub flight_lifecycle_output: ChannelDefinition,
    pub tracked_identities_output: ChannelDefinition,
}

impl Outputs {
    pub fn new(tether_agent: &mut TetherAgent) -> Result<Outputs> {
        let config_output = ChannelOptionsBuilder::create_sender("provideDroneConfig")
            .qos(Some(2))
            .retain(Some(true))
            .build(tether_agent)?;

        // Commands go out at frame rate; a dropped one is superseded next tick
        let rc_control_output = ChannelOptionsBuilder::create_sender("rcControl")
            .qos(Some(0))
            .build(tether_agent)?;

        let flight_lifecycle_output = ChannelOptionsBuilder::create_sender("flightLifecycle")
            .qos(Some(2))
            .build(tether_agent)?;

        let tracked_identities_output = ChannelOptionsBuilder::create_sender("trackedIdentities")
            .qos(Some(0))
            .build(tether_agent)?;

        Ok(Outputs {
            config_output,
            rc_control_output,
            flight_lifecycle_output,
            tracked_identities_output,
        })
    }
}

/// Publishes commands for an external actuation agent to relay to the drones
pub struct TetherActuator {
    tether_agent: TetherAgent,
    outputs: Outputs,
}

impl TetherActuator {
    pub fn new(mut tether_agent: TetherAgent) -> Result<Self> {
        let outputs = Outputs::new(&mut tether_agent)?;
        Ok(TetherActuator {
            tether_agent,
            outputs,
        })
    }

    pub fn publish_config(&self, config: &BackendConfig) -> Result<()> {
        let payload = rmp_serde::to_vec_named(config)?;
        self.tether_agent
            .send(&self.outputs.config_output, Some(&payload))?;
        Ok(())
    }

    pub fn publish_tracked_identities(&self, identities: &[TrackedIdentity]) -> Result<()> {
        let payload = rmp_serde::to_vec_named(identities)?;
        self.tether_agent
            .send(&self.outputs.tracked_identities_output, Some(&payload))?;
        Ok(())
    }

    fn send_lifecycle(&self, drone: &str, action: FlightLifecycle) -> Result<()> {
        let message = FlightLifecycleMessage {
            drone: String::from(drone),
            action,
        };
        debug!("Sending {:?}", &message);
        let payload = rmp_serde::to_vec_named(&message)?;
        self.tether_agent
            .send(&self.outputs.flight_lifecycle_output, Some(&payload))?;
        Ok(())
    }
}

impl Actuator for TetherActuator {
    fn send_control(&mut self, drone: &str, command: RcCommand) -> Result<()> {
        let message = RcControlMessage {
            drone: String::from(drone),
            command,
        };
        let payload = rmp_serde::to_vec_named(&message)?;
        self.tether_agent
            .send(&self.outputs.rc_control_output, Some(&payload))?;
        Ok(())
    }

    fn begin_flight(&mut self, drone: &str) -> Result<()> {
        self.send_lifecycle(drone, FlightLifecycle::Takeoff)
    }

    fn end_flight(&mut self, drone: &str) -> Result<()> {
        self.send_lifecycle(drone, FlightLifecycle::Land)
    }
}
