//! # Plate Executable Parameters
//!
//! This module provides parameters for the plate executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use plate_lib::{sim::SimParams, vision::VisionParams};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PlateExecParams {
    /// Target number of cycles per second.
    ///
    /// Units: Hertz
    pub cycle_frequency_hz: f64,

    /// Send demands to the servos from the start, without waiting for a
    /// `SerialEnable` command
    pub serial_enabled: bool,

    /// Character device the servo controller is attached to. If not given
    /// demands are printed to stdout instead.
    pub serial_device: Option<String>,

    /// Log every demand line sent, as well as sending it
    pub echo_demands: bool,

    /// Write the PlateCtrl status report to the session archive every cycle
    pub archive: bool,

    /// Ball detection filtering
    pub vision: VisionParams,

    /// Simulated plate, only used with `--sim`
    pub sim: SimParams,
}

impl Default for PlateExecParams {
    fn default() -> Self {
        Self {
            cycle_frequency_hz: 75.0,
            serial_enabled: true,
            serial_device: None,
            echo_demands: false,
            archive: true,
            vision: VisionParams::default(),
            sim: SimParams::default(),
        }
    }
}
