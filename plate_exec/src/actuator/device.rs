//! # Serial device sink
//!
//! Writes commands to a character device such as `/dev/ttyACM0`. The line
//! settings (baud rate, framing) are expected to have been set up already, for
//! example with `stty -F /dev/ttyACM0 115200 raw`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, warn};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{ActuatorError, ActuatorSink};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A sink writing to a device file.
///
/// The device is opened when the link is enabled. If a write fails the
/// device is closed and reopened on the next send, so unplugging and
/// replugging the controller recovers without a restart.
#[derive(Debug)]
pub struct DeviceSink {
    path: PathBuf,
    file: Option<File>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DeviceSink {
    /// Create a sink for the device at `path`. The device isn't opened yet.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }
}

impl ActuatorSink for DeviceSink {
    fn open(&mut self) -> Result<(), ActuatorError> {
        let file = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .map_err(|e| ActuatorError::Open(self.path.clone(), e))?;

        debug!("Opened serial device {:?}", self.path);
        self.file = Some(file);
        Ok(())
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), ActuatorError> {
        if self.file.is_none() {
            self.open()?;
        }

        let result = match self.file.as_mut() {
            Some(f) => f.write_all(bytes).and_then(|_| f.flush()),
            None => return Err(ActuatorError::Open(
                self.path.clone(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "device not open"),
            )),
        };

        if let Err(e) = result {
            warn!("Write to {:?} failed, will reopen on next send", self.path);
            self.file = None;
            return Err(ActuatorError::Write(e));
        }

        Ok(())
    }

    fn close(&mut self) {
        self.file = None;
    }
}
