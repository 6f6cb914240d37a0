//! General time utility functions

use chrono;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a duration into a number of seconds, or `None` if the nanosecond
/// count overflows.
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Get the period of a cycle running at the given frequency.
///
/// Returns `None` if the frequency isn't a positive number or the period
/// can't be represented.
pub fn period_from_frequency(frequency_hz: f64) -> Option<std::time::Duration> {
    if !(frequency_hz > 0.0) {
        return None;
    }

    let period_s = 1.0 / frequency_hz;
    if !period_s.is_finite() || period_s > u64::MAX as f64 {
        return None;
    }

    Some(std::time::Duration::from_secs_f64(period_s))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_duration_to_seconds() {
        assert_eq!(
            duration_to_seconds(chrono::Duration::milliseconds(1500)),
            Some(1.5)
        );
        assert_eq!(duration_to_seconds(chrono::Duration::max_value()), None);
    }

    #[test]
    fn test_period_from_frequency() {
        assert_eq!(
            period_from_frequency(4.0),
            Some(std::time::Duration::from_millis(250))
        );
    }

    #[test]
    fn test_invalid_frequency() {
        assert_eq!(period_from_frequency(0.0), None);
        assert_eq!(period_from_frequency(-75.0), None);
        assert_eq!(period_from_frequency(std::f64::NAN), None);
        assert_eq!(period_from_frequency(1e-300), None);
        assert!(period_from_frequency(std::f64::INFINITY).is_some());
    }
}
