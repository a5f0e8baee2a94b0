//! Arithmetic on the unit cyclic domain `[0, 1)` (one full rotation).
//!
//! Inputs are wrapped into the domain first, so callers may pass raw sums
//! such as `reading - offset`.

/// Slack used by [`cyclic_contains`] when comparing arc lengths.
pub const CONTAINS_EPSILON: f64 = 0.001;

/// Wrap any finite value into `[0, 1)`.
#[inline]
pub fn wrap_unit(x: f64) -> f64 {
    let w = x.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if w >= 1.0 { 0.0 } else { w }
}

/// Wrap an angle in degrees into `[0, 360)`.
#[inline]
pub fn wrap_degrees(deg: f64) -> f64 {
    let w = deg.rem_euclid(360.0);
    if w >= 360.0 { 0.0 } else { w }
}

/// Shortest distance between `a` and `b` around the circle, in `[0, 0.5]`.
#[inline]
pub fn cyclic_distance(a: f64, b: f64) -> f64 {
    let d = (wrap_unit(a) - wrap_unit(b)).abs();
    d.min(1.0 - d)
}

/// Signed shortest step from `from` to `to`, in `[-0.5, 0.5]`.
#[inline]
pub fn cyclic_delta(from: f64, to: f64) -> f64 {
    let d = wrap_unit(to) - wrap_unit(from);
    if d > 0.5 {
        d - 1.0
    } else if d < -0.5 {
        d + 1.0
    } else {
        d
    }
}

/// True when `v` lies on the short arc between `a` and `b`.
#[inline]
pub fn cyclic_contains(v: f64, a: f64, b: f64) -> bool {
    cyclic_contains_within(v, a, b, CONTAINS_EPSILON)
}

pub fn cyclic_contains_within(v: f64, a: f64, b: f64, epsilon: f64) -> bool {
    cyclic_distance(v, a) + cyclic_distance(v, b) <= cyclic_distance(a, b) + epsilon
}

/// Midpoint of the short arc between `a` and `b`.
///
/// Readings straddling the wrap boundary (0.98 and 0.02) average to a value
/// near 0, not 0.5.
#[inline]
pub fn cyclic_average(a: f64, b: f64) -> f64 {
    let (a, b) = (wrap_unit(a), wrap_unit(b));
    if (a - b).abs() <= 0.5 {
        (a + b) / 2.0
    } else {
        wrap_unit((a + b) / 2.0 + 0.5)
    }
}

/// Midpoint of the long arc between `a` and `b`, opposite [`cyclic_average`].
#[inline]
pub fn complementary_midpoint(a: f64, b: f64) -> f64 {
    wrap_unit(cyclic_average(a, b) + 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn wrap_handles_negatives_and_overflow() {
        assert!(close(wrap_unit(-0.25), 0.75));
        assert!(close(wrap_unit(1.25), 0.25));
        assert!(wrap_unit(-1e-18) < 1.0);
        assert!(close(wrap_degrees(-90.0), 270.0));
        assert!(close(wrap_degrees(720.0), 0.0));
    }

    #[test]
    fn distance_takes_short_way_round() {
        assert!(close(cyclic_distance(0.1, 0.9), 0.2));
        assert!(close(cyclic_distance(0.1, 0.3), 0.2));
        assert!(close(cyclic_distance(0.0, 0.5), 0.5));
    }

    #[test]
    fn delta_is_signed() {
        assert!(close(cyclic_delta(0.9, 0.1), 0.2));
        assert!(close(cyclic_delta(0.1, 0.9), -0.2));
        assert!(close(cyclic_delta(0.2, 0.3), 0.1));
    }

    #[test]
    fn average_across_wrap() {
        assert!(close(cyclic_average(0.02, 0.99), 0.005));
        assert!(close(cyclic_average(0.2, 0.4), 0.3));
        assert!(close(complementary_midpoint(0.2, 0.4), 0.8));
    }

    #[test]
    fn contains_short_arc_only() {
        assert!(cyclic_contains(0.3, 0.2, 0.4));
        assert!(!cyclic_contains(0.8, 0.2, 0.4));
        assert!(cyclic_contains(0.99, 0.95, 0.05));
        assert!(!cyclic_contains(0.5, 0.95, 0.05));
    }
}
