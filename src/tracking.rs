use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::{geometry_utils::Point, systems::identity::Identity};

/// One frame of candidate positions from perception, as `[x, y]` pairs
pub type DetectionFrame = Vec<(f32, f32)>;

/// Parse one line of perception output (a JSON array of `[x, y]` pairs).
/// A blank line is an empty frame.
pub fn parse_detection_frame(line: &str) -> Result<Vec<Point>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Vec::new());
    }
    let frame: DetectionFrame = serde_json::from_str(line)
        .map_err(|e| anyhow!("Failed to parse detection frame \"{}\": {}", line, e))?;
    Ok(frame.into_iter().map(Point::from).collect())
}

/// Velocity command for one drone. Every axis is clamped to the controller's
/// output limit before it is sent.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RcCommand {
    pub lateral: i32,
    pub forward_back: i32,
    pub vertical: i32,
    pub yaw: i32,
}

impl RcCommand {
    pub fn new(lateral: i32, forward_back: i32, vertical: i32, yaw: i32) -> Self {
        RcCommand {
            lateral,
            forward_back,
            vertical,
            yaw,
        }
    }

    /// Zero lateral and forward/back velocity, keeping vertical and yaw
    pub fn hold(&self) -> Self {
        RcCommand {
            lateral: 0,
            forward_back: 0,
            ..*self
        }
    }

    pub fn is_hold(&self) -> bool {
        self.lateral == 0 && self.forward_back == 0
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RcControlMessage {
    pub drone: String,
    #[serde(flatten)]
    pub command: RcCommand,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FlightLifecycle {
    Takeoff,
    Land,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FlightLifecycleMessage {
    pub drone: String,
    pub action: FlightLifecycle,
}

/// Snapshot of an identity, published each tick for diagnostics/visualisation
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TrackedIdentity {
    pub id: usize,
    pub x: f32,
    pub y: f32,
    pub colour: String,
    pub history: Vec<(f32, f32)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<[f32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_flag: Option<[f32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<(f32, f32)>,
}

impl TrackedIdentity {
    pub fn new(identity: &Identity) -> Self {
        let Point { x, y } = identity.position();
        let tracker = identity.velocity_tracker();
        TrackedIdentity {
            id: identity.id(),
            x,
            y,
            colour: identity.colour().into(),
            history: identity.history().map(|p| p.into()).collect(),
            direction: tracker.dir_vec().ok().map(|v| [v.x, v.y]),
            to_flag: tracker.flag_vec().ok().map(|v| [v.x, v.y]),
            destination: None,
        }
    }

    pub fn with_destination(mut self, destination: Option<Point>) -> Self {
        self.destination = destination.map(|p| p.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_detection_frame() {
        let points = parse_detection_frame("[[100, 100], [500.5, 499]]").unwrap();
        assert_eq!(points, vec![Point::new(100., 100.), Point::new(500.5, 499.)]);
        assert!(parse_detection_frame("   ").unwrap().is_empty());
        assert!(parse_detection_frame("[]").unwrap().is_empty());
        assert!(parse_detection_frame("[[1, 2, 3]]").is_err());
        assert!(parse_detection_frame("not json").is_err());
    }

    #[test]
    fn test_hold_keeps_vertical_and_yaw() {
        let cmd = RcCommand::new(12, -7, 5, -3);
        let held = cmd.hold();
        assert_eq!(held, RcCommand::new(0, 0, 5, -3));
        assert!(held.is_hold());
        assert!(!cmd.is_hold());
    }

    #[test]
    fn test_rc_control_message_is_flat() {
        let msg = RcControlMessage {
            drone: "alpha".into(),
            command: RcCommand::new(1, 2, 3, 4),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["drone"], "alpha");
        assert_eq!(json["forwardBack"], 2);
        assert_eq!(json["yaw"], 4);
    }
}
