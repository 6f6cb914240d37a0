//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp a value into the range `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float,
{
    let mut ret = value;

    if ret > max {
        ret = max
    }
    if ret < min {
        ret = min
    }

    ret
}

/// Cosine easing of a normalised progress value.
///
/// `mu` is clamped into `[0, 1]` and mapped onto `(1 - cos(mu * pi)) / 2`,
/// which starts and finishes with zero slope.
pub fn cos_ease<T>(mu: T) -> T
where
    T: Float,
{
    let zero = T::zero();
    let one = T::one();
    let two = one + one;
    let pi = T::from(std::f64::consts::PI).unwrap_or_else(T::zero);

    (one - (clamp(mu, zero, one) * pi).cos()) / two
}

/// Arithmetic mean of a slice, or `None` if the slice is empty.
pub fn mean<T>(values: &[T]) -> Option<T>
where
    T: Float,
{
    if values.is_empty() {
        return None;
    }

    let sum = values.iter().fold(T::zero(), |acc, &v| acc + v);

    T::from(values.len()).map(|n| sum / n)
}
