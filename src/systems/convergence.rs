use anyhow::Result;
use log::debug;

use crate::{
    actuation::Actuator, error::TrackingError, geometry_utils::Point, tracking::RcCommand,
};

use super::{identity::IdentityRegistry, pid::Pid};

#[derive(Debug, Clone, Copy)]
pub struct ControllerSettings {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// Symmetric clamp for each axis output
    pub output_limit: f32,
    /// Distance (px) below which the drone is held still
    pub arrival_radius: f32,
    /// Hold ticks allowed before signalling readiness for the next setpoint
    pub time_limit: u32,
    pub vertical_velocity: i32,
    pub yaw_velocity: i32,
    /// Seconds between ticks, as seen by the PID loops
    pub dt: f32,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        ControllerSettings {
            kp: 0.2,
            ki: 0.05,
            kd: 0.05,
            output_limit: 30.,
            arrival_radius: 30.,
            time_limit: 5,
            vertical_velocity: 0,
            yaw_velocity: 0,
            dt: 0.033,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlDecision {
    /// Within the arrival radius: no lateral/forward motion while settling
    Hold(RcCommand),
    /// Raw clamped PID output
    Converge(RcCommand),
    /// Settle time used up; the caller should assign a new setpoint
    Arrived,
}

impl ControlDecision {
    pub fn command(&self) -> Option<RcCommand> {
        match self {
            ControlDecision::Hold(c) | ControlDecision::Converge(c) => Some(*c),
            ControlDecision::Arrived => None,
        }
    }
}

/// Drives one identity towards a setpoint with an independent PID loop per
/// image axis.
pub struct ConvergenceController {
    drone: String,
    identity: usize,
    settings: ControllerSettings,
    pid_x: Pid,
    pid_y: Pid,
    destination: Point,
    distance_to_destination: f32,
    wait_counter: u32,
    arrived: bool,
}

impl ConvergenceController {
    pub fn new(
        drone: &str,
        identity: usize,
        destination: Point,
        settings: ControllerSettings,
    ) -> Self {
        let ControllerSettings {
            kp,
            ki,
            kd,
            output_limit,
            ..
        } = settings;
        ConvergenceController {
            drone: String::from(drone),
            identity,
            settings,
            pid_x: Pid::new(kp, ki, kd, destination.x, output_limit),
            pid_y: Pid::new(kp, ki, kd, destination.y, output_limit),
            destination,
            distance_to_destination: 0.,
            wait_counter: 0,
            arrived: false,
        }
    }

    /// Read the bound identity's position and decide what to do this tick.
    ///
    /// Once the settle timer is exhausted the controller reports `Arrived`
    /// whether or not the drone is actually inside the arrival radius.
    pub fn tick(&mut self, registry: &IdentityRegistry) -> Result<ControlDecision, TrackingError> {
        let position = registry.position(self.identity)?;

        let lr_velocity = self.pid_x.update(position.x, self.settings.dt);
        // Image y grows downwards, which is "back" for the drone
        let fb_velocity = -self.pid_y.update(position.y, self.settings.dt);
        self.distance_to_destination = position.distance(&self.destination);

        let command = RcCommand::new(
            lr_velocity as i32,
            fb_velocity as i32,
            self.settings.vertical_velocity,
            self.settings.yaw_velocity,
        );

        if self.distance_to_destination < self.settings.arrival_radius
            && self.wait_counter < self.settings.time_limit
        {
            self.wait_counter += 1;
            debug!(
                "[{}] holding {:.1}px from {:?} ({}/{})",
                self.drone,
                self.distance_to_destination,
                self.destination,
                self.wait_counter,
                self.settings.time_limit
            );
            if self.wait_counter >= self.settings.time_limit {
                self.arrived = true;
            }
            Ok(ControlDecision::Hold(command.hold()))
        } else if self.wait_counter < self.settings.time_limit {
            Ok(ControlDecision::Converge(command))
        } else {
            self.arrived = true;
            Ok(ControlDecision::Arrived)
        }
    }

    /// Tick, then send any resulting command. Transport errors are returned
    /// unchanged.
    pub fn drive(
        &mut self,
        registry: &IdentityRegistry,
        actuator: &mut dyn Actuator,
    ) -> Result<ControlDecision> {
        let decision = self.tick(registry)?;
        if let Some(command) = decision.command() {
            actuator.send_control(&self.drone, command)?;
        }
        Ok(decision)
    }

    /// Move to a new destination: both loops get the new setpoint and lose
    /// their integral/derivative history, and the settle timer restarts.
    pub fn set_setpoint(&mut self, destination: Point) {
        self.pid_x.set_setpoint(destination.x);
        self.pid_y.set_setpoint(destination.y);
        self.pid_x.reset();
        self.pid_y.reset();
        self.arrived = false;
        self.wait_counter = 0;
        self.destination = destination;
    }

    pub fn begin_flight(&self, actuator: &mut dyn Actuator) -> Result<()> {
        actuator.begin_flight(&self.drone)
    }

    pub fn end_flight(&self, actuator: &mut dyn Actuator) -> Result<()> {
        actuator.end_flight(&self.drone)
    }

    pub fn drone(&self) -> &str {
        &self.drone
    }

    pub fn identity(&self) -> usize {
        self.identity
    }

    pub fn destination(&self) -> Point {
        self.destination
    }

    pub fn distance_to_destination(&self) -> f32 {
        self.distance_to_destination
    }

    pub fn wait_counter(&self) -> u32 {
        self.wait_counter
    }

    pub fn arrived(&self) -> bool {
        self.arrived
    }
}
