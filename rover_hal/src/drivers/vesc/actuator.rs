//! VESC motor controller actuator.
//!
//! Writes framed `SetDutyCycle(0)` commands over a byte link. The link is
//! fire-and-forget: no response is read back.

use super::codec::encode_command;
use rover_common::hal::config::ActuatorConfig;
use rover_common::hal::driver::{ActuatorError, MotorActuator};
use rover_common::hal::types::MotorCommand;
use std::io::Write;
use tracing::{debug, error, info};

/// Motor actuator speaking the VESC serial protocol.
pub struct VescActuator {
    port: String,
    link: Option<Box<dyn Write + Send>>,
    connect_error: Option<String>,
    frames_sent: u64,
}

impl VescActuator {
    /// Create an actuator over an already open link.
    pub fn with_link(port: impl Into<String>, link: impl Write + Send + 'static) -> Self {
        Self {
            port: port.into(),
            link: Some(Box::new(link)),
            connect_error: None,
            frames_sent: 0,
        }
    }

    /// Create an actuator whose link could not be opened.
    ///
    /// The failure is logged here and kept for [`MotorActuator::connect_error`];
    /// every `stop()` afterwards returns `ActuatorError::NotConnected`.
    pub fn disconnected(port: impl Into<String>, reason: &str) -> Self {
        let port = port.into();
        error!("Error connecting to VESC on {}: {}", port, reason);
        Self {
            connect_error: Some(format!("{port}: {reason}")),
            port,
            link: None,
            frames_sent: 0,
        }
    }

    /// Open the configured serial port.
    ///
    /// Never fails: an unavailable port yields a disconnected actuator.
    #[cfg(feature = "serial-hardware")]
    pub fn open(config: &ActuatorConfig) -> Self {
        match serialport::new(&config.port, config.baud_rate)
            .timeout(config.read_timeout())
            .open()
        {
            Ok(port) => {
                info!(
                    "VESC connection established on {} @ {} baud",
                    config.port, config.baud_rate
                );
                Self::with_link(config.port.clone(), port)
            }
            Err(e) => Self::disconnected(config.port.clone(), &e.to_string()),
        }
    }

    /// Open the configured serial port.
    ///
    /// Serial support is compiled out; the actuator is always disconnected.
    #[cfg(not(feature = "serial-hardware"))]
    pub fn open(config: &ActuatorConfig) -> Self {
        info!("Serial support not built in; VESC on {} unavailable", config.port);
        Self::disconnected(
            config.port.clone(),
            "built without the 'serial-hardware' feature",
        )
    }

    /// Whether the link is open.
    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Number of frames written successfully.
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Port identifier.
    pub fn port(&self) -> &str {
        &self.port
    }

    fn send(&mut self, command: MotorCommand) -> Result<(), ActuatorError> {
        let link = self.link.as_mut().ok_or(ActuatorError::NotConnected)?;
        let frame =
            encode_command(command).map_err(|e| ActuatorError::LinkFailure(e.to_string()))?;
        link.write_all(&frame)
            .map_err(|e| ActuatorError::LinkFailure(e.to_string()))?;
        link.flush()
            .map_err(|e| ActuatorError::LinkFailure(e.to_string()))?;
        self.frames_sent += 1;
        Ok(())
    }
}

impl MotorActuator for VescActuator {
    fn name(&self) -> &'static str {
        "vesc"
    }

    fn stop(&mut self) -> Result<(), ActuatorError> {
        self.send(MotorCommand::Stop)?;
        debug!("Stop command sent to VESC on {}", self.port);
        Ok(())
    }

    fn connect_error(&self) -> Option<&str> {
        self.connect_error.as_deref()
    }

    fn close(&mut self) {
        if self.link.take().is_some() {
            info!("VESC link on {} closed", self.port);
        }
    }
}
