//! # Setpoint motion profile
//!
//! New targets are not applied instantly. The setpoint travels from where it
//! currently is to the new target at a fixed average speed, following a
//! cosine ease so it starts and stops with zero velocity.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Point2;
use serde::Serialize;
use util::maths::{clamp, cos_ease};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Shortest allowed move duration, used when the target doesn't move.
///
/// Units: seconds
pub const MIN_MOVE_DURATION_S: f64 = 1e-6;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An in-progress move of the setpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SetpointMotion {
    old_target: Point2<f64>,
    new_target: Point2<f64>,
    start_time_s: f64,
    duration_s: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SetpointMotion {
    /// A motion which holds the setpoint at `target`.
    pub fn hold(target: Point2<f64>) -> Self {
        Self {
            old_target: target,
            new_target: target,
            start_time_s: 0.0,
            duration_s: MIN_MOVE_DURATION_S,
        }
    }

    /// Start moving towards `target` from wherever the setpoint is at
    /// `time_s`. Any move already in progress is superseded.
    pub fn set_target(&mut self, target: Point2<f64>, time_s: f64, speed_pxs: f64) {
        let current = self.current(time_s);
        let distance = (target - current).norm();

        self.old_target = current;
        self.new_target = target;
        self.start_time_s = time_s;
        self.duration_s = (distance / speed_pxs).max(MIN_MOVE_DURATION_S);
    }

    /// Progress through the move at `time_s`, from 0 to 1.
    pub fn progress(&self, time_s: f64) -> f64 {
        clamp((time_s - self.start_time_s) / self.duration_s, 0.0, 1.0)
    }

    /// The interpolated setpoint at `time_s`.
    pub fn current(&self, time_s: f64) -> Point2<f64> {
        let ease = cos_ease(self.progress(time_s));

        Point2::from(self.old_target.coords * (1.0 - ease) + self.new_target.coords * ease)
    }

    /// True once the setpoint has arrived at its target.
    pub fn is_finished(&self, time_s: f64) -> bool {
        self.progress(time_s) >= 1.0
    }

    /// Where the setpoint is moving to.
    pub fn target(&self) -> &Point2<f64> {
        &self.new_target
    }

    /// How long the current move takes.
    pub fn duration_s(&self) -> f64 {
        self.duration_s
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const EPS: f64 = 1e-9;

    fn moving_right() -> SetpointMotion {
        let mut m = SetpointMotion::hold(Point2::new(0.0, 0.0));
        m.set_target(Point2::new(120.0, 0.0), 0.0, 120.0);
        m
    }

    #[test]
    fn test_duration() {
        let m = moving_right();
        assert!((m.duration_s() - 1.0).abs() < EPS);

        // Not moving still gives a usable duration
        let mut still = SetpointMotion::hold(Point2::new(5.0, 5.0));
        still.set_target(Point2::new(5.0, 5.0), 3.0, 120.0);
        assert_eq!(still.duration_s(), MIN_MOVE_DURATION_S);
        assert_eq!(still.current(3.0), Point2::new(5.0, 5.0));
        assert_eq!(still.current(4.0), Point2::new(5.0, 5.0));
    }

    #[test]
    fn test_endpoints() {
        let m = moving_right();

        assert_eq!(m.current(0.0), Point2::new(0.0, 0.0));
        assert_eq!(m.current(-1.0), Point2::new(0.0, 0.0));
        assert_eq!(m.current(1.0), Point2::new(120.0, 0.0));
        assert_eq!(m.current(25.0), Point2::new(120.0, 0.0));
        assert!(!m.is_finished(0.5));
        assert!(m.is_finished(1.0));
    }

    #[test]
    fn test_midpoint() {
        let p = moving_right().current(0.5);

        assert!((p[0] - 60.0).abs() < EPS);
        assert!(p[1].abs() < EPS);
    }

    #[test]
    fn test_monotonic_along_line() {
        let mut m = SetpointMotion::hold(Point2::new(10.0, 20.0));
        m.set_target(Point2::new(-50.0, 100.0), 2.0, 120.0);

        let mut prev_dist = 0.0;
        for i in 0..=50 {
            let t = 2.0 + m.duration_s() * (i as f64) / 50.0;
            let p = m.current(t);
            let from_start = p - Point2::new(10.0, 20.0);

            // Stays on the line between the targets
            let dir = (Point2::new(-50.0, 100.0) - Point2::new(10.0, 20.0)).normalize();
            assert!((from_start[0] * dir[1] - from_start[1] * dir[0]).abs() < 1e-6);

            // Never moves backwards
            let dist = from_start.norm();
            assert!(dist + EPS >= prev_dist);
            prev_dist = dist;
        }
    }

    #[test]
    fn test_retarget_mid_move() {
        let mut m = moving_right();
        let mid = m.current(0.5);

        m.set_target(Point2::new(60.0, 120.0), 0.5, 120.0);

        // The new move starts from wherever the old one had reached
        assert!((m.current(0.5) - mid).norm() < EPS);
        assert!((m.duration_s() - 1.0).abs() < 1e-6);
        assert_eq!(m.target(), &Point2::new(60.0, 120.0));
    }
}
