//! # Calibration geometry
//!
//! The operator marks one point in the camera image per servo axis. From these
//! the centre of the plate and one projection vector per axis are derived,
//! scaled so that each calibration point sits at exactly `target_scale` along
//! its own axis.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use nalgebra::{Point2, Rotation2, Vector2};
use serde::Serialize;

// Internal
use super::{project, AxisCoords, GeometryFault, PlateCtrlError, NUM_AXES};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Calibration points closer than this to their centre are rejected.
///
/// Units: pixels
pub const MIN_AXIS_LENGTH_PX: f64 = 1e-6;

/// Calibration triangles with a smaller area than this are considered
/// collinear.
///
/// Units: pixels^2
pub const MIN_CALIB_AREA_PX2: f64 = 1.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Projection vectors for a single axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisTransform {
    /// Unit vector pointing from the centre towards the axis' calibration point
    pub pre_scale: Vector2<f64>,

    /// `pre_scale` divided by the distance to the calibration point and
    /// multiplied by the target scale
    pub scaled: Vector2<f64>,
}

/// A completed calibration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Calibration {
    points: [Point2<f64>; NUM_AXES],
    center: Point2<f64>,
    transforms: [AxisTransform; NUM_AXES],
    target_scale: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Calibration {
    /// Build a calibration from one point per axis.
    ///
    /// Point sets which are collinear, or where a point coincides with the
    /// centre, are rejected since they cannot define three distinct axes.
    pub fn from_points(
        points: [Point2<f64>; NUM_AXES],
        target_scale: f64,
    ) -> Result<Self, PlateCtrlError> {
        let area = triangle_area(&points);
        if !(area >= MIN_CALIB_AREA_PX2) {
            return Err(PlateCtrlError::InvalidCalibrationGeometry(
                GeometryFault::Collinear(area),
            ));
        }

        let center = centroid(&points);

        let mut transforms = [AxisTransform {
            pre_scale: Vector2::zeros(),
            scaled: Vector2::zeros(),
        }; NUM_AXES];

        for (i, point) in points.iter().enumerate() {
            // A point can only sit on the centroid of a zero area triangle,
            // so the area check above normally catches this first.
            transforms[i] = derive_axis_transform(point, &center, target_scale)
                .ok_or(PlateCtrlError::InvalidCalibrationGeometry(
                    GeometryFault::PointAtCentre(i),
                ))?;

            debug!(
                "Axis {} transform: pre-scale ({:.4}, {:.4}), scaled ({:.4}, {:.4})",
                i,
                transforms[i].pre_scale[0],
                transforms[i].pre_scale[1],
                transforms[i].scaled[0],
                transforms[i].scaled[1]
            );
        }

        Ok(Self {
            points,
            center,
            transforms,
            target_scale,
        })
    }

    /// Project a point in the camera frame onto the three axes.
    pub fn project(&self, point: &Point2<f64>) -> AxisCoords {
        project(point, &self.center, &self.transforms)
    }

    /// The calibration points, one per axis.
    pub fn points(&self) -> &[Point2<f64>; NUM_AXES] {
        &self.points
    }

    /// The centre of the calibration points.
    pub fn center(&self) -> &Point2<f64> {
        &self.center
    }

    /// The per-axis projection vectors.
    pub fn transforms(&self) -> &[AxisTransform; NUM_AXES] {
        &self.transforms
    }

    /// The value a calibration point takes on its own axis.
    pub fn target_scale(&self) -> f64 {
        self.target_scale
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Arithmetic mean of the calibration points.
pub fn centroid(points: &[Point2<f64>; NUM_AXES]) -> Point2<f64> {
    let sum = points
        .iter()
        .fold(Vector2::zeros(), |acc: Vector2<f64>, p| acc + p.coords);

    Point2::from(sum / NUM_AXES as f64)
}

/// Derive the transform for the axis running from `center` to `point`.
///
/// The canonical axis `(0, 1)` is rotated onto the direction of the point,
/// then scaled by `target_scale / |point - center|`. Returns `None` if the
/// point is too close to the centre for the direction to be defined.
pub fn derive_axis_transform(
    point: &Point2<f64>,
    center: &Point2<f64>,
    target_scale: f64,
) -> Option<AxisTransform> {
    let v = point - center;
    let mag = v.norm();

    if !(mag >= MIN_AXIS_LENGTH_PX) {
        return None;
    }

    let canonical = Vector2::<f64>::new(0.0, 1.0);
    let angle = v[1].atan2(v[0]) - canonical[1].atan2(canonical[0]);
    let pre_scale = Rotation2::new(angle) * canonical;

    Some(AxisTransform {
        pre_scale,
        scaled: pre_scale / mag * target_scale,
    })
}

/// Unsigned area of the triangle formed by the points.
fn triangle_area(points: &[Point2<f64>; NUM_AXES]) -> f64 {
    let ab = points[1] - points[0];
    let ac = points[2] - points[0];

    (ab[0] * ac[1] - ab[1] * ac[0]).abs() / 2.0
}
