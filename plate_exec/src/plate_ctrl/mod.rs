//! # Plate control module
//!
//! Plate control turns the observed ball position into three servo angles.
//! It is calibrated by marking the direction of each servo axis in the camera
//! image, after which each frame:
//!
//! 1. Advances the setpoint along its motion profile.
//! 2. Projects the ball and setpoint onto the three axes.
//! 3. Runs one PID step per axis and emits the resulting angles.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod calib;
mod cmd;
mod params;
mod pid;
mod projector;
mod setpoint;
mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use calib::*;
pub use cmd::*;
pub use params::*;
pub use pid::*;
pub use projector::*;
pub use setpoint::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The number of servo axes supporting the plate.
pub const NUM_AXES: usize = 3;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during plate control.
#[derive(Debug, thiserror::Error)]
pub enum PlateCtrlError {
    #[error("Invalid calibration geometry: {0}")]
    InvalidCalibrationGeometry(GeometryFault),

    #[error("Calibration points can only be added while calibrating")]
    NotCalibrating,

    #[error("A target can only be set once calibration is complete")]
    NotRunning,
}

/// The reason a set of calibration points was rejected.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GeometryFault {
    #[error("calibration point {0} coincides with the centre of the points")]
    PointAtCentre(usize),

    #[error("calibration points are collinear (triangle area {0:.3} px^2)")]
    Collinear(f64),
}
