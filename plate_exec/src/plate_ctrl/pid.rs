//! # Per-axis PID controllers
//!
//! Each axis runs an independent PID controller working in frame steps rather
//! than wall-clock time. Its output is smoothed with a moving average over the
//! last few actions while the error changes slowly, and passed through raw
//! when the error jumps so the plate reacts quickly to large disturbances.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;
use util::maths::{clamp, mean};

// Internal
use super::Params;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of recent actions averaged when smoothing.
pub const ACTION_HISTORY_LEN: usize = 5;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Fixed size ring buffer of the most recent actions.
///
/// The buffer starts full of zeros, so the first few averages are pulled
/// towards neutral.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ActionHistory {
    actions: [f64; ACTION_HISTORY_LEN],
    cursor: usize,
}

/// A single axis' PID controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AxisPid {
    /// The integral accumulation, gain already applied
    integral: f64,

    /// Error on the previous step
    prev_error: f64,

    /// Recent (clamped) actions
    history: ActionHistory,
}

/// The result of one controller step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AxisStep {
    /// Error between setpoint and ball along the axis
    pub error: f64,

    /// The clamped action before smoothing, relative to neutral.
    ///
    /// Units: degrees
    pub raw_action_deg: f64,

    /// True if the output was averaged over the action history
    pub smoothed: bool,

    /// Absolute servo angle demand.
    ///
    /// Units: degrees
    pub demand_deg: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ActionHistory {
    /// Overwrite the oldest action with `action`.
    pub fn push(&mut self, action: f64) {
        self.actions[self.cursor] = action;
        self.cursor = (self.cursor + 1) % ACTION_HISTORY_LEN;
    }

    /// Mean of every slot in the buffer.
    pub fn mean(&self) -> f64 {
        mean(&self.actions).unwrap_or(0.0)
    }

    /// The raw contents of the buffer, in slot order.
    pub fn actions(&self) -> &[f64; ACTION_HISTORY_LEN] {
        &self.actions
    }
}

impl AxisPid {
    /// Create a new controller with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all accumulated state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Run one step of the controller for the given setpoint and ball
    /// positions along this axis.
    pub fn step(&mut self, setpoint: f64, ball: f64, params: &Params) -> AxisStep {
        let error = setpoint - ball;
        let delta = error - self.prev_error;

        // Anti-windup
        self.integral = clamp(
            self.integral + error * params.k_i,
            -params.integral_limit,
            params.integral_limit,
        );

        let raw_action = clamp(
            params.k_p * error + self.integral + params.k_d * delta,
            params.min_action_deg,
            params.max_action_deg,
        );

        self.history.push(raw_action);

        // Only smooth while the error isn't growing quickly, a sudden jump
        // must get through to the servos straight away.
        let smoothed = delta < params.smoothing_threshold;
        let action = if smoothed {
            self.history.mean()
        } else {
            raw_action
        };

        self.prev_error = error;

        AxisStep {
            error,
            raw_action_deg: raw_action,
            smoothed,
            demand_deg: action + params.neutral_angle_deg,
        }
    }

    /// The current integral accumulation.
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// The error seen on the previous step.
    pub fn prev_error(&self) -> f64 {
        self.prev_error
    }

    /// The recent action history.
    pub fn history(&self) -> &ActionHistory {
        &self.history
    }
}
