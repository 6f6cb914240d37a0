//! Plate control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for plate control.
///
/// Any field missing from the parameter file takes its default value.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Params {
    /// Proportional gain, applied to the per-axis error
    pub k_p: f64,

    /// Integral gain, applied to the error before accumulation
    pub k_i: f64,

    /// Derivative gain, applied to the per-frame change in error
    pub k_d: f64,

    /// Symmetric limit on the accumulated integral term
    pub integral_limit: f64,

    /// Lower limit of the per-axis action, relative to neutral.
    ///
    /// Units: degrees
    pub min_action_deg: f64,

    /// Upper limit of the per-axis action, relative to neutral.
    ///
    /// Units: degrees
    pub max_action_deg: f64,

    /// While the error grows by less than this per frame the action is averaged
    /// over the recent history, above it the raw action is used.
    pub smoothing_threshold: f64,

    /// Servo angle holding the plate level.
    ///
    /// Units: degrees
    pub neutral_angle_deg: f64,

    /// Side length of the canonical equilateral triangle the calibration
    /// points are mapped onto. A calibration point projects onto half of this
    /// on its own axis.
    pub target_side_length: f64,

    /// Speed at which the setpoint travels to a new target.
    ///
    /// Units: pixels/second
    pub setpoint_speed_pxs: f64,

    /// Width of the camera frame.
    ///
    /// Units: pixels
    pub frame_width_px: f64,

    /// Height of the camera frame.
    ///
    /// Units: pixels
    pub frame_height_px: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            k_p: 0.3,
            k_i: 0.001,
            k_d: 5.0,
            integral_limit: 10.0,
            min_action_deg: -10.0,
            max_action_deg: 45.0,
            smoothing_threshold: 1.75,
            neutral_angle_deg: 45.0,
            target_side_length: 250.0,
            setpoint_speed_pxs: 120.0,
            frame_width_px: 640.0,
            frame_height_px: 480.0,
        }
    }
}

impl Params {
    /// The projection of a calibration point onto its own axis, half the
    /// side length of the canonical triangle.
    pub fn target_scale(&self) -> f64 {
        self.target_side_length / 2.0
    }

    /// Replace the controller gains, leaving everything else untouched.
    pub fn with_gains(&self, k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self {
            k_p,
            k_i,
            k_d,
            ..self.clone()
        }
    }
}
