//! Axis projection

use nalgebra::Point2;

use super::{AxisTransform, NUM_AXES};

/// The position of a point along each of the three axes.
pub type AxisCoords = [f64; NUM_AXES];

/// Project a point in the camera frame onto each axis.
///
/// Each coordinate is the dot product of the offset from the centre with the
/// axis' scaled transform.
pub fn project(
    point: &Point2<f64>,
    center: &Point2<f64>,
    transforms: &[AxisTransform; NUM_AXES],
) -> AxisCoords {
    let offset = point - center;

    let mut coords = [0f64; NUM_AXES];
    for (c, t) in coords.iter_mut().zip(transforms.iter()) {
        *c = offset.dot(&t.scaled);
    }

    coords
}
