//! Axis and trigger normalization
//!
//! Pure functions turning raw integer readings into normalized floats.
//! Degenerate ranges (deadzone at or above the stick maximum, threshold at or
//! above the trigger maximum) produce 0 instead of dividing by zero.

/// Largest positive stick reading
pub const STICK_MAX: i32 = i16::MAX as i32;
/// Largest trigger reading
pub const TRIGGER_MAX: i32 = u8::MAX as i32;

/// Maps a raw stick axis to `-1.0..=1.0`, treating `|raw| <= deadzone` as centered
/// and rescaling the remaining travel to the full range.
pub fn normalize_stick(raw: i16, deadzone: u32) -> f32 {
    let deadzone = deadzone.min(STICK_MAX as u32) as i32;
    if deadzone >= STICK_MAX {
        return 0.0;
    }

    let magnitude = (raw as i32).abs();
    if magnitude <= deadzone {
        return 0.0;
    }

    let scaled = ((magnitude - deadzone) as f32 / (STICK_MAX - deadzone) as f32).clamp(0.0, 1.0);
    if raw < 0 {
        -scaled
    } else {
        scaled
    }
}

/// Maps a raw trigger to `0.0..=1.0`; readings at or below `threshold` are 0.
pub fn normalize_trigger(raw: u8, threshold: u32) -> f32 {
    let threshold = threshold.min(TRIGGER_MAX as u32) as i32;
    if threshold >= TRIGGER_MAX {
        return 0.0;
    }

    let raw = raw as i32;
    if raw <= threshold {
        return 0.0;
    }
    ((raw - threshold) as f32 / (TRIGGER_MAX - threshold) as f32).clamp(0.0, 1.0)
}

/// Raises the magnitude of `v` to `gamma`, keeping its sign. `gamma == 1.0` is the identity.
pub fn apply_curve(v: f32, gamma: f32) -> f32 {
    let shaped = v.abs().powf(gamma);
    if v < 0.0 {
        -shaped
    } else {
        shaped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f32 = 1e-6;

    #[test]
    fn left_stick_scenario() {
        assert!((normalize_stick(32767, 7849) - 1.0).abs() < EPS);
        assert_eq!(normalize_stick(5000, 7849), 0.0);
        let expected = -((20000.0 - 7849.0) / (32767.0 - 7849.0));
        assert!((normalize_stick(-20000, 7849) - expected).abs() < EPS);
    }

    #[test]
    fn trigger_scenario() {
        assert!((normalize_trigger(255, 30) - 1.0).abs() < EPS);
        assert_eq!(normalize_trigger(30, 30), 0.0);
        assert!((normalize_trigger(31, 30) - 1.0 / 225.0).abs() < EPS);
    }

    #[test]
    fn most_negative_reading_is_clamped() {
        assert_eq!(normalize_stick(i16::MIN, 0), -1.0);
    }

    #[test]
    fn degenerate_ranges_yield_zero() {
        assert_eq!(normalize_stick(32767, 32767), 0.0);
        assert_eq!(normalize_stick(-32768, 40000), 0.0);
        assert_eq!(normalize_trigger(255, 255), 0.0);
        assert_eq!(normalize_trigger(255, 1000), 0.0);
    }

    #[test]
    fn curve_shapes_magnitude() {
        assert!((apply_curve(0.5, 2.0) - 0.25).abs() < EPS);
        assert!((apply_curve(-0.5, 2.0) + 0.25).abs() < EPS);
        assert_eq!(apply_curve(0.0, 2.4), 0.0);
    }

    proptest! {
        #[test]
        fn inside_deadzone_is_zero(deadzone in 0u32..=20000, raw in -20000i16..=20000) {
            prop_assume!((raw as i32).abs() <= deadzone as i32);
            prop_assert_eq!(normalize_stick(raw, deadzone), 0.0);
        }

        #[test]
        fn stick_is_bounded(deadzone in 0u32..40000, raw in any::<i16>()) {
            let v = normalize_stick(raw, deadzone);
            prop_assert!((-1.0..=1.0).contains(&v));
        }

        #[test]
        fn stick_is_monotonic(deadzone in 0u32..=20000, a in 0i16..=i16::MAX, b in 0i16..=i16::MAX) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(normalize_stick(lo, deadzone) <= normalize_stick(hi, deadzone));
            prop_assert!(normalize_stick(-lo, deadzone) >= normalize_stick(-hi, deadzone));
        }

        #[test]
        fn full_deflection_is_one(deadzone in 0u32..32767) {
            prop_assert!((normalize_stick(i16::MAX, deadzone) - 1.0).abs() < EPS);
        }

        #[test]
        fn trigger_is_bounded(threshold in 0u32..300, raw in any::<u8>()) {
            let v = normalize_trigger(raw, threshold);
            prop_assert!((0.0..=1.0).contains(&v));
        }

        #[test]
        fn linear_curve_is_identity(v in -1.0f32..=1.0) {
            prop_assert!((apply_curve(v, 1.0) - v).abs() <= f32::EPSILON);
        }

        #[test]
        fn curve_preserves_sign(v in -1.0f32..=1.0, gamma in 1.0f32..4.0) {
            prop_assume!(v.abs() > 1e-3);
            prop_assert_eq!(apply_curve(v, gamma).signum(), v.signum());
        }
    }
}
