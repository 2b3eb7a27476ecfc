use std::net::{IpAddr, Ipv4Addr};

use clap::{command, Parser};

const DRONE_CONFIG_PATH: &str = "./drones.json";
const BROKER_HOST: IpAddr = IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1));

/// Reads one JSON array of [x, y] detections per line on stdin, keeps a
/// stable identity per drone and steers each towards its waypoints
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Drone list, waypoints and controller tuning (JSON)
    #[arg(long = "droneConfigPath", default_value_t = String::from(DRONE_CONFIG_PATH))]
    pub config_path: String,

    /// MQTT broker address
    #[arg(long = "tether.host", default_value_t = BROKER_HOST)]
    pub tether_host: IpAddr,

    #[arg(long = "tether.role", default_value_t = String::from("droneNavigation"))]
    pub agent_role: String,

    #[arg(long = "tether.group", default_value_t = String::from("any"))]
    pub agent_group: String,

    /// Broker login, if the broker requires one
    #[arg(long = "tether.username")]
    pub tether_username: Option<String>,

    #[arg(long = "tether.password")]
    pub tether_password: Option<String>,

    /// Log commands instead of publishing them; no broker connection is made
    #[arg(long = "dryRun")]
    pub dry_run: bool,

    #[arg(long = "loglevel", default_value_t = String::from("info"))]
    pub log_level: String,
}
