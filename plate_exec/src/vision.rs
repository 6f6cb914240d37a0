//! # Vision interface
//!
//! Finding the ball in a camera frame is done outside this crate. Detectors
//! hand over at most one candidate per frame through [`BallDetector`], and the
//! [`RadiusGate`] drops candidates which can't be the ball.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A source of ball detections, polled once per frame.
pub trait BallDetector {
    /// Get the best ball candidate in the latest frame, or `None` if there
    /// isn't one.
    fn detect(&mut self) -> Option<BallDetection>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A detected circle in the camera frame.
///
/// Units: pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallDetection {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

/// Vision parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionParams {
    /// If false every detection is ignored
    pub track_ball: bool,

    /// Smallest radius accepted as the ball
    pub min_ball_radius_px: f64,

    /// Largest radius accepted as the ball
    pub max_ball_radius_px: f64,
}

/// Filters detections by radius and by whether tracking is enabled.
#[derive(Debug, Clone, Default)]
pub struct RadiusGate {
    params: VisionParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl BallDetection {
    pub fn new(x: f64, y: f64, radius: f64) -> Self {
        Self { x, y, radius }
    }

    /// Centre of the detection
    pub fn position(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }
}

impl Default for VisionParams {
    fn default() -> Self {
        Self {
            track_ball: true,
            min_ball_radius_px: 5.0,
            max_ball_radius_px: 75.0,
        }
    }
}

impl RadiusGate {
    pub fn new(params: VisionParams) -> Self {
        Self { params }
    }

    /// Pass the detection through if tracking is on and its radius is within
    /// the configured band.
    pub fn apply(&self, detection: Option<BallDetection>) -> Option<BallDetection> {
        if !self.params.track_ball {
            return None;
        }

        detection.filter(|d| {
            if !(d.x.is_finite() && d.y.is_finite()) {
                debug!("Ignoring candidate at non-finite position ({}, {})", d.x, d.y);
                return false;
            }

            let ok = d.radius >= self.params.min_ball_radius_px
                && d.radius <= self.params.max_ball_radius_px;
            if !ok {
                debug!("Ignoring candidate with radius {:.1} px", d.radius);
            }
            ok
        })
    }

    /// Poll a detector and filter the result.
    pub fn detect<D: BallDetector + ?Sized>(&self, detector: &mut D) -> Option<BallDetection> {
        self.apply(detector.detect())
    }

    /// Turn ball tracking on or off.
    pub fn set_track_ball(&mut self, enabled: bool) {
        self.params.track_ball = enabled;
    }

    pub fn params(&self) -> &VisionParams {
        &self.params
    }
}
