//! Utility maths functions
//!
//! Angular quantities are handled in degrees since that is the unit the
//! world's rotary actuators report in.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Clamp a value between a minimum and maximum.
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

/// Wrap an angle in degrees into the range [0, 360).
pub fn wrap_360<T>(angle: T) -> T
where
    T: Float,
{
    rem_euclid(angle, T::from(360.0).unwrap())
}

/// Get the signed shortest angular distance from `a` to `b` in degrees.
///
/// The result is in the range [-180, 180], accounting for wrapping between
/// 0 and 360. A positive result means `b` is reached from `a` by a positive
/// rotation.
pub fn get_ang_dist_360<T>(a: T, b: T) -> T
where
    T: Float,
{
    let full_t: T = T::from(360.0).unwrap();

    let c = rem_euclid(a - b, full_t);
    let d = rem_euclid(b - a, full_t);

    if c < d {
        -c
    } else {
        d
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::from(0.0).unwrap() {
        r + rhs.abs()
    } else {
        r
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_ang_dist_360() {
        assert_eq!(get_ang_dist_360(10f64, 20f64), 10f64);
        assert_eq!(get_ang_dist_360(20f64, 10f64), -10f64);
        assert_eq!(get_ang_dist_360(0f64, 360f64), 0f64);
        assert_eq!(get_ang_dist_360(360f64, 0f64), 0f64);
        assert_eq!(get_ang_dist_360(10f64, 360f64), -10f64);
        assert_eq!(get_ang_dist_360(0f64, 350f64), -10f64);
        assert_eq!(get_ang_dist_360(350f64, 10f64), 20f64);
    }

    #[test]
    fn test_wrap_360() {
        assert_eq!(wrap_360(370f64), 10f64);
        assert_eq!(wrap_360(-10f64), 350f64);
        assert_eq!(wrap_360(0f64), 0f64);
        assert_eq!(wrap_360(360f64), 0f64);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5f64, 0f64, 1f64), 1f64);
        assert_eq!(clamp(-5f64, 0f64, 1f64), 0f64);
        assert_eq!(clamp(0.5f64, 0f64, 1f64), 0.5f64);
    }
}
