//! # Operator input
//!
//! Commands an operator can give the plate controller, either from a script
//! or from some other front end, and the function that applies them.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

// Internal
use crate::actuator::{ActuatorError, ActuatorSink, SerialLink};
use crate::plate_ctrl::{PlateCtrl, PlateCtrlError};
use crate::vision::RadiusGate;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An operator command.
///
/// In scripts commands are written as JSON objects tagged by `type`, for
/// example `{"type": "SetTarget", "x": 300, "y": 200}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlateCmd {
    /// Mark the next calibration point, in camera pixels
    CalibrationPoint { x: f64, y: f64 },

    /// Move the setpoint to a new target, in camera pixels
    SetTarget { x: f64, y: f64 },

    /// Forget the calibration and start marking points again
    Recalibrate,

    SerialEnable,

    SerialDisable,

    /// Turn ball tracking on or off
    TrackBall { enabled: bool },

    /// Replace the PID gains
    SetGains { k_p: f64, k_i: f64, k_d: f64 },
}

/// Reasons a command couldn't be applied.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Command rejected by PlateCtrl: {0}")]
    PlateCtrl(#[from] PlateCtrlError),

    #[error("Command rejected by the serial link: {0}")]
    Actuator(#[from] ActuatorError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Apply an operator command at `time_s`.
pub fn exec<S: ActuatorSink>(
    cmd: &PlateCmd,
    time_s: f64,
    plate_ctrl: &mut PlateCtrl,
    link: &mut SerialLink<S>,
    gate: &mut RadiusGate,
) -> Result<(), InputError> {
    debug!("Executing {:?}", cmd);

    match cmd {
        PlateCmd::CalibrationPoint { x, y } => {
            plate_ctrl.add_calibration_point(Point2::new(*x, *y))?;
        }
        PlateCmd::SetTarget { x, y } => {
            plate_ctrl.set_target(Point2::new(*x, *y), time_s)?;
        }
        PlateCmd::Recalibrate => plate_ctrl.recalibrate(),
        PlateCmd::SerialEnable => {
            link.enable()?;
            info!("Serial output enabled");
        }
        PlateCmd::SerialDisable => {
            link.disable();
            info!("Serial output disabled");
        }
        PlateCmd::TrackBall { enabled } => {
            gate.set_track_ball(*enabled);
            info!("Ball tracking {}", if *enabled { "on" } else { "off" });
        }
        PlateCmd::SetGains { k_p, k_i, k_d } => {
            let params = plate_ctrl.params().with_gains(*k_p, *k_i, *k_d);
            plate_ctrl.set_params(params);
        }
    }

    Ok(())
}
