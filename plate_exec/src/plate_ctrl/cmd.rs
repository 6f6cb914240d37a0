//! Servo demand command

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use std::fmt;

use super::NUM_AXES;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Absolute angle demands for the three servos.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ServoDemands {
    /// Units: degrees
    pub angles_deg: [f64; NUM_AXES],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ServoDemands {
    /// Demands holding every servo at `neutral_deg`, keeping the plate level.
    pub fn neutral(neutral_deg: f64) -> Self {
        Self {
            angles_deg: [neutral_deg; NUM_AXES],
        }
    }

    /// Format as the line sent to the servo controller: each angle to five
    /// decimal places followed by a space, terminated by a newline.
    pub fn to_line(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for ServoDemands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for a in self.angles_deg.iter() {
            write!(f, "{:.5} ", a)?;
        }
        Ok(())
    }
}
