use std::f32::consts::{PI, TAU};

#[inline]
#[must_use]
pub fn lerp(start: f32, end: f32, t: f32) -> f32 {
    start + (end - start) * t
}

/// Wraps an angle difference into `(-PI, PI]`.
#[inline]
#[must_use]
pub fn wrap_angle(delta: f32) -> f32 {
    let wrapped = (delta + PI).rem_euclid(TAU) - PI;
    // rem_euclid maps +PI to -PI; keep the positive half-turn
    if wrapped <= -PI { PI } else { wrapped }
}

/// Interpolates two angles (radians) along the shorter arc.
///
/// The result is not re-normalised: it lies between `start` and
/// `start + wrap_angle(end - start)`.
#[inline]
#[must_use]
pub fn lerp_angle(start: f32, end: f32, t: f32) -> f32 {
    start + wrap_angle(end - start) * t
}

/// Cubic Hermite basis.
///
/// `out_tangent0` and `in_tangent1` are slopes per unit of time; `dt` is the
/// bracket's time span and scales them into the unit interval.
#[inline]
#[must_use]
pub fn hermite(v0: f32, out_tangent0: f32, in_tangent1: f32, v1: f32, t: f32, dt: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;

    let s2 = -2.0 * t3 + 3.0 * t2;
    let s3 = t3 - t2;
    let s0 = 1.0 - s2;
    let s1 = s3 - t2 + t;

    let m0 = out_tangent0 * dt;
    let m1 = in_tangent1 * dt;

    s0 * v0 + s1 * m0 + s2 * v1 + s3 * m1
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn wrap_angle_stays_in_half_open_range() {
        assert!((wrap_angle(0.0)).abs() < EPSILON);
        assert!((wrap_angle(TAU) - 0.0).abs() < EPSILON);
        assert!((wrap_angle(PI) - PI).abs() < EPSILON);
        assert!((wrap_angle(-PI) - PI).abs() < EPSILON);
        assert!((wrap_angle(1.5 * PI) + 0.5 * PI).abs() < EPSILON);
    }

    #[test]
    fn hermite_endpoints() {
        assert!((hermite(2.0, 5.0, -3.0, 7.0, 0.0, 4.0) - 2.0).abs() < EPSILON);
        assert!((hermite(2.0, 5.0, -3.0, 7.0, 1.0, 4.0) - 7.0).abs() < EPSILON);
    }

    #[test]
    fn hermite_flat_tangents_midpoint() {
        assert!((hermite(0.0, 0.0, 0.0, 1.0, 0.5, 10.0) - 0.5).abs() < EPSILON);
    }
}
