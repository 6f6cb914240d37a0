//! In-memory sink

use super::{ActuatorError, ActuatorSink};

/// Keeps every line sent to it. Used for testing and for running against the
/// simulator without hardware attached.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    lines: Vec<String>,

    /// If set, every send fails with this message
    fail_with: Option<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following send fail, as a disconnected device would.
    pub fn fail_sends(&mut self, reason: &str) {
        self.fail_with = Some(reason.to_string());
    }

    /// Let sends succeed again.
    pub fn restore(&mut self) {
        self.fail_with = None;
    }

    /// Lines sent so far, oldest first.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The most recent line.
    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(|l| l.as_str())
    }
}

impl ActuatorSink for MemorySink {
    fn send(&mut self, bytes: &[u8]) -> Result<(), ActuatorError> {
        if let Some(reason) = &self.fail_with {
            return Err(ActuatorError::Write(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                reason.clone(),
            )));
        }

        self.lines.push(String::from_utf8_lossy(bytes).into_owned());
        Ok(())
    }
}
