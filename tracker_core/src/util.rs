//! Angle/time helpers for dead reckoning.

/// Degrees in one revolution.
pub const DEGREES_PER_REV: f64 = 360.0;
/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: u64 = 1_000;

/// Actuation seconds needed to travel `degrees` on an axis that turns once
/// every `revolution_s` seconds.
#[inline]
pub fn seconds_for_degrees(degrees: f64, revolution_s: f64) -> f64 {
    degrees * revolution_s / DEGREES_PER_REV
}

/// Angle covered by `position_s` seconds of actuation.
#[inline]
pub fn degrees_for_seconds(position_s: f64, revolution_s: f64) -> f64 {
    position_s * DEGREES_PER_REV / revolution_s
}

/// `Duration` from a seconds value, mapping negative or non-finite input to zero.
#[inline]
pub fn duration_from_secs(secs: f64) -> std::time::Duration {
    if secs.is_finite() && secs > 0.0 {
        std::time::Duration::from_secs_f64(secs)
    } else {
        std::time::Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_revolution_is_360_degrees() {
        assert!((degrees_for_seconds(18.63, 18.63) - 360.0).abs() < 1e-9);
    }

    #[test]
    fn coarse_yaw_step_matches_rig_constant() {
        // 15° on an 18.63 s revolution
        assert!((seconds_for_degrees(15.0, 18.63) - 0.77625).abs() < 1e-9);
    }

    #[test]
    fn degrees_and_seconds_are_inverse() {
        let s = seconds_for_degrees(123.4, 127.44);
        assert!((degrees_for_seconds(s, 127.44) - 123.4).abs() < 1e-9);
    }

    #[test]
    fn duration_from_secs_guards_bad_input() {
        assert!(duration_from_secs(-1.0).is_zero());
        assert!(duration_from_secs(f64::NAN).is_zero());
        assert_eq!(duration_from_secs(1.5).as_millis(), 1500);
    }
}
