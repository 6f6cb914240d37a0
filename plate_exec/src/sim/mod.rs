//! # Simulated plate
//!
//! A headless stand-in for the camera and mechanics, so the controller can be
//! exercised without hardware. Three support points sit 120 degrees apart
//! around the plate centre, each lifted by a servo horn. The plate plane is
//! fitted through the support heights and a solid ball rolls down its slope.
//!
//! Everything is expressed in camera pixels apart from the support heights.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;
use nalgebra::{Point2, Vector2};

use crate::plate_ctrl::{ServoDemands, NUM_AXES};
use crate::vision::{BallDetection, BallDetector};

pub use params::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Gravitational acceleration.
///
/// Units: metres/second^2
const GRAVITY_MS2: f64 = 9.81;

/// Fraction of gravity accelerating a solid sphere rolling without slipping.
const ROLLING_FACTOR: f64 = 5.0 / 7.0;

/// Servo angle the simulation starts at.
///
/// Units: degrees
const INITIAL_SERVO_DEG: f64 = 45.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The simulated plate and ball.
#[derive(Debug, Clone)]
pub struct SimPlate {
    params: SimParams,

    /// Unit vectors from the plate centre to each support point
    dirs: [Vector2<f64>; NUM_AXES],

    servo_deg: [f64; NUM_AXES],

    ball_px: Point2<f64>,
    ball_vel_pxs: Vector2<f64>,

    on_plate: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimPlate {
    /// Create a new simulation with the plate level and the ball at rest.
    pub fn new(params: SimParams) -> Self {
        let mut dirs = [Vector2::zeros(); NUM_AXES];
        for (i, d) in dirs.iter_mut().enumerate() {
            let angle = (params.first_axis_angle_deg + 120.0 * i as f64).to_radians();
            *d = Vector2::new(angle.cos(), angle.sin());
        }

        let ball_px = Point2::new(params.initial_ball_px[0], params.initial_ball_px[1]);

        let mut sim = Self {
            params,
            dirs,
            servo_deg: [INITIAL_SERVO_DEG; NUM_AXES],
            ball_px,
            ball_vel_pxs: Vector2::zeros(),
            on_plate: true,
        };
        sim.on_plate = sim.within_plate(&ball_px);
        sim
    }

    /// Camera positions of the support points, in axis order. These are the
    /// points an operator would mark during calibration.
    pub fn support_points_px(&self) -> [Point2<f64>; NUM_AXES] {
        let centre = self.centre();
        let mut pts = [centre; NUM_AXES];
        for (p, d) in pts.iter_mut().zip(self.dirs.iter()) {
            *p = centre + d * self.params.support_radius_px;
        }
        pts
    }

    /// Apply new servo demands. They hold until the next call.
    pub fn set_demands(&mut self, dems: &ServoDemands) {
        self.servo_deg = dems.angles_deg;
    }

    /// Slope of the plate, the height gained per unit distance travelled in
    /// the camera frame.
    pub fn gradient(&self) -> Vector2<f64> {
        let radius_m = self.params.support_radius_px / self.params.px_per_m;

        let weighted = self
            .servo_deg
            .iter()
            .zip(self.dirs.iter())
            .fold(Vector2::zeros(), |acc: Vector2<f64>, (deg, d)| {
                acc + d * (self.params.servo_arm_m * deg.to_radians().cos())
            });

        // Plane through three points spaced evenly on a circle
        weighted * (2.0 / (3.0 * radius_m))
    }

    /// Advance the simulation by `dt_s` seconds.
    pub fn step(&mut self, dt_s: f64) {
        if !self.on_plate {
            return;
        }

        let grad = self.gradient();
        let slope_factor = 1.0 / (1.0 + grad.norm_squared()).sqrt();
        let accel_pxs2 = -grad * (ROLLING_FACTOR * GRAVITY_MS2 * slope_factor * self.params.px_per_m);

        self.ball_vel_pxs += (accel_pxs2 - self.ball_vel_pxs * self.params.damping_per_s) * dt_s;
        self.ball_px += self.ball_vel_pxs * dt_s;

        if !self.within_plate(&self.ball_px) {
            info!(
                "Simulated ball rolled off the plate at ({:.1}, {:.1})",
                self.ball_px[0], self.ball_px[1]
            );
            self.on_plate = false;
        }
    }

    /// Put the ball somewhere new, at rest.
    pub fn place_ball(&mut self, ball_px: Point2<f64>) {
        self.ball_px = ball_px;
        self.ball_vel_pxs = Vector2::zeros();
        self.on_plate = self.within_plate(&ball_px);
    }

    pub fn ball_px(&self) -> Point2<f64> {
        self.ball_px
    }

    pub fn ball_vel_pxs(&self) -> Vector2<f64> {
        self.ball_vel_pxs
    }

    pub fn is_ball_on_plate(&self) -> bool {
        self.on_plate
    }

    pub fn centre(&self) -> Point2<f64> {
        Point2::new(self.params.plate_centre_px[0], self.params.plate_centre_px[1])
    }

    fn within_plate(&self, p: &Point2<f64>) -> bool {
        (p - self.centre()).norm() <= self.params.support_radius_px
    }
}

impl BallDetector for SimPlate {
    fn detect(&mut self) -> Option<BallDetection> {
        if self.on_plate {
            Some(BallDetection::new(
                self.ball_px[0],
                self.ball_px[1],
                self.params.ball_radius_px,
            ))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_support_points() {
        let sim = SimPlate::new(SimParams::default());
        let pts = sim.support_points_px();

        // First support straight up the image
        assert!((pts[0][0] - 320.0).abs() < 1e-9);
        assert!((pts[0][1] - 60.0).abs() < 1e-9);

        for p in pts.iter() {
            assert!(((p - sim.centre()).norm() - 180.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_level_plate_holds_ball() {
        let mut sim = SimPlate::new(SimParams::default());
        let start = sim.ball_px();

        for _ in 0..100 {
            sim.step(0.01);
        }

        assert!(sim.gradient().norm() < 1e-12);
        assert!((sim.ball_px() - start).norm() < 1e-6);
        assert!(sim.is_ball_on_plate());
    }

    #[test]
    fn test_ball_rolls_towards_lowered_support() {
        let mut sim = SimPlate::new(SimParams::default());
        sim.place_ball(sim.centre());

        // Raising the servo angle lowers that support point
        sim.set_demands(&ServoDemands {
            angles_deg: [60.0, 45.0, 45.0],
        });

        for _ in 0..20 {
            sim.step(0.01);
        }

        let moved = sim.ball_px() - sim.centre();
        let towards_support = sim.support_points_px()[0] - sim.centre();
        assert!(moved.dot(&towards_support) > 0.0);
        assert!(moved.norm() > 0.0);
    }

    #[test]
    fn test_ball_lost_off_edge() {
        let mut sim = SimPlate::new(SimParams::default());
        assert!(sim.detect().is_some());

        sim.place_ball(Point2::new(320.0, 500.0));
        assert!(!sim.is_ball_on_plate());
        assert!(sim.detect().is_none());

        // Rolling off the edge
        sim.place_ball(Point2::new(320.0, 410.0));
        sim.set_demands(&ServoDemands {
            angles_deg: [30.0, 70.0, 70.0],
        });
        for _ in 0..500 {
            sim.step(0.01);
        }
        assert!(!sim.is_ball_on_plate());
        assert!(sim.detect().is_none());
    }
}
