use anyhow::Result;
use log::info;

use crate::tracking::RcCommand;

/// Transport that carries velocity commands and flight lifecycle calls to a
/// physical drone. Failures are returned to the caller as-is; nothing here
/// retries.
pub trait Actuator {
    fn send_control(&mut self, drone: &str, command: RcCommand) -> Result<()>;
    fn begin_flight(&mut self, drone: &str) -> Result<()>;
    fn end_flight(&mut self, drone: &str) -> Result<()>;
}

/// Logs every command instead of sending it anywhere ("dry run")
#[derive(Default)]
pub struct LoggingActuator;

impl Actuator for LoggingActuator {
    fn send_control(&mut self, drone: &str, command: RcCommand) -> Result<()> {
        info!("[{}] rc {:?}", drone, command);
        Ok(())
    }

    fn begin_flight(&mut self, drone: &str) -> Result<()> {
        info!("[{}] takeoff", drone);
        Ok(())
    }

    fn end_flight(&mut self, drone: &str) -> Result<()> {
        info!("[{}] land", drone);
        Ok(())
    }
}
