//! Simulation parameters

use serde::{Deserialize, Serialize};

/// Parameters of the simulated plate, ball and camera.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SimParams {
    /// Centre of the plate in the camera frame.
    ///
    /// Units: pixels
    pub plate_centre_px: [f64; 2],

    /// Distance from the plate centre to each support point. The ball falls
    /// off once it's further out than this.
    ///
    /// Units: pixels
    pub support_radius_px: f64,

    /// Angle in the camera frame of the first support point, the others
    /// follow at 120 degree steps.
    ///
    /// Units: degrees
    pub first_axis_angle_deg: f64,

    /// Camera scale at the plate.
    ///
    /// Units: pixels/metre
    pub px_per_m: f64,

    /// Length of the servo horn lifting each support point.
    ///
    /// Units: metres
    pub servo_arm_m: f64,

    /// Linear velocity damping of the rolling ball.
    ///
    /// Units: 1/seconds
    pub damping_per_s: f64,

    /// Radius the ball appears with in the camera frame.
    ///
    /// Units: pixels
    pub ball_radius_px: f64,

    /// Where the ball starts.
    ///
    /// Units: pixels
    pub initial_ball_px: [f64; 2],
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            plate_centre_px: [320.0, 240.0],
            support_radius_px: 180.0,
            first_axis_angle_deg: -90.0,
            px_per_m: 1200.0,
            servo_arm_m: 0.02,
            damping_per_s: 0.8,
            ball_radius_px: 18.0,
            initial_ball_px: [380.0, 260.0],
        }
    }
}
