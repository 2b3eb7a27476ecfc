pub mod convergence;
pub mod identity;
pub mod mission;
pub mod pid;
pub mod velocity;

use anyhow::Result;
use convergence::{ControlDecision, ConvergenceController};
use identity::IdentityRegistry;
use indexmap::IndexMap;
use log::{debug, info, warn};
use mission::Mission;

use crate::{
    actuation::Actuator, backend_config::BackendConfig, geometry_utils::Point,
    tracking::TrackedIdentity,
};

/// A drone bound to a tracked identity, with its controller and waypoints
pub struct DroneAgent {
    pub controller: ConvergenceController,
    pub mission: Mission,
}

pub struct Systems {
    pub identity_registry: IdentityRegistry,
    /// Keyed by identity id, in registration order
    pub drones: IndexMap<usize, DroneAgent>,
    vector_sample_ticks: u32,
    ticks: u64,
}

impl Systems {
    pub fn new(config: &BackendConfig) -> Result<Systems> {
        config.validate()?;
        let mut identity_registry =
            IdentityRegistry::new(config.history_length, config.identity_expire_ticks)?;
        let settings = config.controller_settings();

        let mut drones = IndexMap::new();
        for drone in config.drones.iter() {
            let initial_position = Point::from(drone.initial_position);
            let id = identity_registry
                .create_identity(initial_position, drone.colour.as_deref())
                .id();

            let mission = Mission::new(
                drone.waypoints.iter().map(|p| Point::from(*p)).collect(),
                config.loop_waypoints,
            );
            let destination = mission.current().unwrap_or(initial_position);
            info!(
                "Drone \"{}\" is identity #{}, first destination {:?}",
                &drone.name, id, destination
            );

            drones.insert(
                id,
                DroneAgent {
                    controller: ConvergenceController::new(&drone.name, id, destination, settings),
                    mission,
                },
            );
        }
        identity_registry.set_vector_starts();

        Ok(Systems {
            identity_registry,
            drones,
            vector_sample_ticks: config.vector_sample_ticks.max(1),
            ticks: 0,
        })
    }

    pub fn begin_flight(&mut self, actuator: &mut dyn Actuator) -> Result<()> {
        for drone in self.drones.values() {
            drone.controller.begin_flight(actuator)?;
        }
        Ok(())
    }

    pub fn end_flight(&mut self, actuator: &mut dyn Actuator) -> Result<()> {
        for drone in self.drones.values() {
            drone.controller.end_flight(actuator)?;
        }
        Ok(())
    }

    /// One frame: resolve candidates into identities, then drive every drone.
    /// Drones whose settle time has run out move on to their next waypoint.
    /// A drone whose identity expires is told to land and is no longer driven.
    pub fn tick(
        &mut self,
        candidates: &[Point],
        actuator: &mut dyn Actuator,
    ) -> Result<Vec<(usize, ControlDecision)>> {
        self.ticks += 1;

        self.identity_registry.update_positions(candidates);
        for id in self.identity_registry.expire_stale() {
            if let Some(drone) = self.drones.shift_remove(&id) {
                warn!(
                    "Lost drone \"{}\" (identity #{}); landing it",
                    drone.controller.drone(),
                    id
                );
                drone.controller.end_flight(actuator)?;
            }
        }

        if self.ticks % self.vector_sample_ticks as u64 == 0 {
            self.sample_vectors();
        }

        let mut decisions = Vec::with_capacity(self.drones.len());
        for (id, drone) in self.drones.iter_mut() {
            let decision = drone.controller.drive(&self.identity_registry, actuator)?;
            if decision == ControlDecision::Arrived {
                if let Some(next) = drone.mission.advance() {
                    debug!(
                        "Drone \"{}\" moving on to {:?}",
                        drone.controller.drone(),
                        next
                    );
                    drone.controller.set_setpoint(next);
                }
            }
            decisions.push((*id, decision));
        }

        Ok(decisions)
    }

    /// Give each drone one destination, in registration order. Extra
    /// destinations are ignored.
    pub fn assign_destinations(&mut self, destinations: &[Point]) {
        for (drone, destination) in self.drones.values_mut().zip(destinations.iter()) {
            drone.controller.set_setpoint(*destination);
        }
    }

    pub fn tracked_identities(&self) -> Vec<TrackedIdentity> {
        self.identity_registry
            .iter()
            .map(|identity| {
                let destination = self
                    .drones
                    .get(&identity.id())
                    .map(|d| d.controller.destination());
                TrackedIdentity::new(identity).with_destination(destination)
            })
            .collect()
    }

    /// Close the current sampling window and open the next one. Each
    /// identity's target flag is its drone's current destination.
    fn sample_vectors(&mut self) {
        for (id, drone) in self.drones.iter() {
            if let Some(identity) = self.identity_registry.get_mut(*id) {
                identity
                    .velocity_tracker_mut()
                    .set_target(drone.controller.destination());
            }
        }
        self.identity_registry.set_vector_ends();
        let updated = self.identity_registry.update_vectors();
        debug!("Updated direction vectors for {} identities", updated);
        self.identity_registry.set_vector_starts();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuation::testing::{RecordingActuator, Sent};
    use crate::backend_config::DroneConfig;
    use crate::tracking::FlightLifecycle;

    fn config() -> BackendConfig {
        BackendConfig {
            drones: vec![
                DroneConfig {
                    name: "alpha".into(),
                    colour: None,
                    initial_position: (100., 100.),
                    waypoints: vec![(100., 100.), (300., 100.)],
                },
                DroneConfig {
                    name: "bravo".into(),
                    colour: Some("#00ffff".into()),
                    initial_position: (500., 500.),
                    waypoints: vec![],
                },
            ],
            settle_time_limit: 2,
            vector_sample_ticks: 2,
            ..Default::default()
        }
    }

    #[test]
    fn test_drones_bound_to_identities_in_order() {
        let systems = Systems::new(&config()).unwrap();
        assert_eq!(systems.identity_registry.ids(), vec![1, 2]);
        let names: Vec<&str> = systems.drones.values().map(|d| d.controller.drone()).collect();
        assert_eq!(names, vec!["alpha", "bravo"]);
        // No waypoints: hold the initial position
        assert_eq!(
            systems.drones[&2].controller.destination(),
            Point::new(500., 500.)
        );
        assert_eq!(systems.identity_registry.get(2).unwrap().colour(), "#00ffff");
    }

    #[test]
    fn test_lifecycle_for_every_drone() {
        let mut systems = Systems::new(&config()).unwrap();
        let mut actuator = RecordingActuator::default();
        systems.begin_flight(&mut actuator).unwrap();
        systems.end_flight(&mut actuator).unwrap();
        assert_eq!(
            actuator.sent,
            vec![
                Sent::Lifecycle("alpha".into(), FlightLifecycle::Takeoff),
                Sent::Lifecycle("bravo".into(), FlightLifecycle::Takeoff),
                Sent::Lifecycle("alpha".into(), FlightLifecycle::Land),
                Sent::Lifecycle("bravo".into(), FlightLifecycle::Land),
            ]
        );
    }

    #[test]
    fn test_arrival_advances_to_next_waypoint() {
        let mut systems = Systems::new(&config()).unwrap();
        let mut actuator = RecordingActuator::default();
        let frame = [Point::new(100., 100.), Point::new(500., 500.)];

        // Two hold ticks use up the settle time, the third reports arrival
        for _ in 0..2 {
            let decisions = systems.tick(&frame, &mut actuator).unwrap();
            assert!(matches!(decisions[0].1, ControlDecision::Hold(_)));
        }
        let decisions = systems.tick(&frame, &mut actuator).unwrap();
        assert_eq!(decisions[0], (1, ControlDecision::Arrived));
        assert_eq!(
            systems.drones[&1].controller.destination(),
            Point::new(300., 100.)
        );
        assert!(!systems.drones[&1].controller.arrived());

        let decisions = systems.tick(&frame, &mut actuator).unwrap();
        assert!(matches!(decisions[0].1, ControlDecision::Converge(c) if c.lateral > 0));
    }

    #[test]
    fn test_vectors_sampled_towards_destination() {
        let mut systems = Systems::new(&config()).unwrap();
        let mut actuator = RecordingActuator::default();
        systems
            .tick(&[Point::new(110., 100.), Point::new(500., 500.)], &mut actuator)
            .unwrap();
        assert!(systems.tracked_identities()[0].direction.is_none());

        systems
            .tick(&[Point::new(120., 100.), Point::new(500., 500.)], &mut actuator)
            .unwrap();
        let tracked = systems.tracked_identities();
        assert_eq!(tracked[0].direction, Some([20., 0.]));
        assert_eq!(tracked[0].to_flag, Some([-20., 0.]));
        assert_eq!(tracked[0].destination, Some((100., 100.)));
    }

    #[test]
    fn test_assign_destinations_in_registration_order() {
        let mut systems = Systems::new(&config()).unwrap();
        systems.assign_destinations(&[
            Point::new(1., 1.),
            Point::new(2., 2.),
            Point::new(3., 3.),
        ]);
        assert_eq!(systems.drones[&1].controller.destination(), Point::new(1., 1.));
        assert_eq!(systems.drones[&2].controller.destination(), Point::new(2., 2.));
    }

    #[test]
    fn test_expired_identity_loses_its_controller() {
        let mut config = config();
        config.identity_expire_ticks = Some(1);
        let mut systems = Systems::new(&config).unwrap();
        let mut actuator = RecordingActuator::default();

        for _ in 0..2 {
            systems.tick(&[Point::new(100., 100.)], &mut actuator).unwrap();
        }
        assert_eq!(systems.identity_registry.ids(), vec![1]);
        assert_eq!(systems.drones.keys().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_expired_drone_is_landed_once() {
        let mut config = config();
        config.identity_expire_ticks = Some(1);
        let mut systems = Systems::new(&config).unwrap();
        let mut actuator = RecordingActuator::default();

        systems.begin_flight(&mut actuator).unwrap();
        for _ in 0..2 {
            systems.tick(&[Point::new(100., 100.)], &mut actuator).unwrap();
        }
        systems.end_flight(&mut actuator).unwrap();

        let lands: Vec<&Sent> = actuator
            .sent
            .iter()
            .filter(|s| matches!(s, Sent::Lifecycle(_, FlightLifecycle::Land)))
            .collect();
        assert_eq!(
            lands,
            vec![
                &Sent::Lifecycle("bravo".into(), FlightLifecycle::Land),
                &Sent::Lifecycle("alpha".into(), FlightLifecycle::Land),
            ]
        );
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let config = BackendConfig {
            history_length: 0,
            ..config()
        };
        assert!(Systems::new(&config).is_err());
    }

    #[test]
    fn test_actuation_failure_reaches_caller() {
        let mut systems = Systems::new(&config()).unwrap();
        let mut actuator = RecordingActuator::failing();
        assert!(systems
            .tick(&[Point::new(150., 100.), Point::new(500., 500.)], &mut actuator)
            .is_err());
    }
}
