//! Type definition of Float, otherwise constants and functions which
//! can be used almost everywhere else in the code.

// std
use std::ops::{Add, Mul, Sub};
// others
use num;

pub type Float = f32;

pub const MACHINE_EPSILON: Float = std::f32::EPSILON * 0.5;

/// Reciprocals of direction components are clamped to this magnitude
/// so that axis-parallel rays never produce infinities or NaNs in the
/// slab tests.
pub const MIN_RCP_INPUT: Float = 1.0e-18;

/// Error propagation.
pub fn gamma(n: i32) -> Float {
    (n as Float * MACHINE_EPSILON) / (1.0 - n as Float * MACHINE_EPSILON)
}

/// Interpolate linearly between two provided values.
pub fn lerp<S, T>(t: S, a: T, b: T) -> T
where
    S: num::One,
    S: Sub<S, Output = S>,
    S: Copy,
    T: Add<T, Output = T>,
    T: Mul<S, Output = T>,
{
    let one: S = num::One::one();
    a * (one - t) + b * t
}

/// Reciprocal that never returns an infinity: values closer to zero
/// than [`MIN_RCP_INPUT`] are replaced by that magnitude, keeping the
/// sign (including the sign of zero).
pub fn rcp_safe(x: Float) -> Float {
    if x.abs() < MIN_RCP_INPUT {
        1.0 as Float / MIN_RCP_INPUT.copysign(x)
    } else {
        1.0 as Float / x
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lerp_between_values() {
        assert_eq!(lerp(0.25 as Float, 0.0 as Float, 4.0 as Float), 1.0);
        assert_eq!(lerp(1.0 as Float, -2.0 as Float, 3.0 as Float), 3.0);
    }

    #[test]
    fn rcp_safe_stays_finite() {
        assert!(rcp_safe(0.0).is_finite());
        assert!(rcp_safe(0.0) > 0.0);
        assert!(rcp_safe(-0.0) < 0.0);
        assert_eq!(rcp_safe(2.0), 0.5);
    }
}
