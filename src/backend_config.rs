use log::{debug, error, info, warn};
use std::fs;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::systems::{convergence::ControllerSettings, identity::DEFAULT_HISTORY_LENGTH};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DroneConfig {
    pub name: String,
    /// Hex colour used to tag this drone's identity; generated if omitted
    pub colour: Option<String>,
    /// Where (in image pixels) the drone is expected to be detected first
    pub initial_position: (f32, f32),
    #[serde(default)]
    pub waypoints: Vec<(f32, f32)>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase", default)]
pub struct BackendConfig {
    /// Drones in the order their identities are registered (and matched)
    pub drones: Vec<DroneConfig>,

    // -------- IDENTITY TRACKING SETTINGS
    /// How many past positions each identity keeps
    pub history_length: usize,

    /// Remove an identity after this many consecutive ticks without a matching
    /// detection; never remove if unset
    pub identity_expire_ticks: Option<u32>,

    /// How many ticks between direction vector samples
    pub vector_sample_ticks: u32,

    // -------- CONTROLLER SETTINGS
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,

    /// Velocity commands are clamped to [-outputLimit, outputLimit] on each axis
    pub output_limit: f32,

    /// Distance (px) from the destination considered "arrived"; the drone is
    /// held still while inside it
    pub arrival_radius: f32,

    /// Ticks to hold inside the arrival radius before moving to the next waypoint
    pub settle_time_limit: u32,

    pub vertical_velocity: i32,
    pub yaw_velocity: i32,

    /// Expected time (ms) between frames, used as the PID time step
    pub control_interval_ms: u64,

    /// Start again from the first waypoint after the last one
    pub loop_waypoints: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        let controller = ControllerSettings::default();
        BackendConfig {
            drones: Vec::new(),
            history_length: DEFAULT_HISTORY_LENGTH,
            identity_expire_ticks: None,
            vector_sample_ticks: 10,
            kp: controller.kp,
            ki: controller.ki,
            kd: controller.kd,
            output_limit: controller.output_limit,
            arrival_radius: controller.arrival_radius,
            settle_time_limit: controller.time_limit,
            vertical_velocity: controller.vertical_velocity,
            yaw_velocity: controller.yaw_velocity,
            control_interval_ms: 33,
            loop_waypoints: false,
        }
    }
}

impl BackendConfig {
    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            kp: self.kp,
            ki: self.ki,
            kd: self.kd,
            output_limit: self.output_limit,
            arrival_radius: self.arrival_radius,
            time_limit: self.settle_time_limit,
            vertical_velocity: self.vertical_velocity,
            yaw_velocity: self.yaw_velocity,
            dt: self.control_interval_ms as f32 / 1000.,
        }
    }

    /// Reject settings the tracker or controller cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.history_length == 0 {
            return Err(anyhow!("historyLength must be at least 1"));
        }
        if !self.output_limit.is_finite() {
            return Err(anyhow!("outputLimit must be a finite number"));
        }
        if !self.arrival_radius.is_finite() || self.arrival_radius < 0. {
            return Err(anyhow!("arrivalRadius must be a non-negative number"));
        }
        if self.control_interval_ms == 0 {
            return Err(anyhow!("controlIntervalMs must be above 0"));
        }
        Ok(())
    }

    pub fn write_config_to_file(&self, config_file_path: &str) -> Result<()> {
        debug!("Current state of config: {:?}", self);
        let text = serde_json::to_string_pretty(self)?;
        match fs::write(config_file_path, text) {
            Ok(()) => {
                info!("Wrote config to file: {:?}", config_file_path);
                Ok(())
            }
            Err(e) => {
                error!("Error writing config to file: {:?}", e);
                Err(anyhow!("Failed to write config to {}: {}", config_file_path, e))
            }
        }
    }
}

pub fn load_config_from_file(config_file_path: &str) -> Result<BackendConfig> {
    match std::fs::read_to_string(config_file_path) {
        Err(e) => {
            if e.kind() == std::io::ErrorKind::NotFound {
                warn!(
                    "Drone config file not found at {}, using defaults (no drones)",
                    &config_file_path
                );
                Ok(BackendConfig::default())
            } else {
                Err(anyhow!(
                    "Failed to load drone config from disk; error: {:?}",
                    e
                ))
            }
        }
        Ok(s) => {
            info!("Loaded drone config OK from \"{}\"", config_file_path);
            match serde_json::from_str::<BackendConfig>(&s) {
                Ok(loaded_config) => {
                    debug!("Config parsed data from file: {:?}", &loaded_config);
                    loaded_config.validate()?;
                    Ok(loaded_config)
                }
                Err(e) => Err(anyhow!("Failed to parse config data: {}", e)),
            }
        }
    }
}
