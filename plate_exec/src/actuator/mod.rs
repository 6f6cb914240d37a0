//! # Actuator link
//!
//! The servos are driven by a microcontroller listening on a serial line. The
//! control core only needs somewhere to write command lines to, which is
//! provided by an [`ActuatorSink`]. [`SerialLink`] adds the on/off switch on
//! top of a sink.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// [`ActuatorSink`] writing to a serial character device.
pub mod device;

/// [`ActuatorSink`] echoing to stdout.
pub mod console;

/// [`ActuatorSink`] collecting lines in memory.
pub mod memory;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::info;
use std::path::PathBuf;

use crate::plate_ctrl::ServoDemands;

pub use console::ConsoleSink;
pub use device::DeviceSink;
pub use memory::MemorySink;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Somewhere servo command lines can be written.
pub trait ActuatorSink {
    /// Write a complete command to the sink.
    fn send(&mut self, bytes: &[u8]) -> Result<(), ActuatorError>;

    /// Prepare the sink for sending, called when the link is enabled.
    fn open(&mut self) -> Result<(), ActuatorError> {
        Ok(())
    }

    /// Release the sink, called when the link is disabled.
    fn close(&mut self) {}
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A sink which can be switched on and off.
pub struct SerialLink<S> {
    sink: S,
    enabled: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum ActuatorError {
    #[error("Could not open {0:?}: {1}")]
    Open(PathBuf, std::io::Error),

    #[error("Could not write the command: {0}")]
    Write(std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<S: ActuatorSink + ?Sized> ActuatorSink for Box<S> {
    fn send(&mut self, bytes: &[u8]) -> Result<(), ActuatorError> {
        (**self).send(bytes)
    }

    fn open(&mut self) -> Result<(), ActuatorError> {
        (**self).open()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

impl<S: ActuatorSink> SerialLink<S> {
    /// Create a new link, disabled.
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            enabled: false,
        }
    }

    /// Open the sink and start sending commands.
    ///
    /// If the sink can't be opened the link stays disabled.
    pub fn enable(&mut self) -> Result<(), ActuatorError> {
        if !self.enabled {
            self.sink.open()?;
            self.enabled = true;
            info!("Serial link enabled");
        }
        Ok(())
    }

    /// Stop sending commands and close the sink.
    pub fn disable(&mut self) {
        if self.enabled {
            self.sink.close();
            self.enabled = false;
            info!("Serial link disabled");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Send the demands if the link is enabled.
    ///
    /// Returns whether the demands were sent.
    pub fn emit(&mut self, dems: &ServoDemands) -> Result<bool, ActuatorError> {
        if !self.enabled {
            return Ok(false);
        }

        self.sink.send(dems.to_line().as_bytes())?;
        Ok(true)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}
