//! Stdout sink

use std::io::Write;

use super::{ActuatorError, ActuatorSink};

/// Prints every command to stdout, for watching the controller without any
/// hardware attached.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ActuatorSink for ConsoleSink {
    fn send(&mut self, bytes: &[u8]) -> Result<(), ActuatorError> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(bytes).map_err(ActuatorError::Write)?;
        handle.flush().map_err(ActuatorError::Write)
    }
}
