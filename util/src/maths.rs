//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Clamp a value into the range `[min, max]`.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float,
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Convert an angle in degrees to radians.
pub fn deg_to_rad<T>(deg: T) -> T
where
    T: Float,
{
    deg * T::from(std::f64::consts::PI).unwrap() / T::from(180.0).unwrap()
}

/// Convert an angle in radians to degrees.
pub fn rad_to_deg<T>(rad: T) -> T
where
    T: Float,
{
    rad * T::from(180.0).unwrap() / T::from(std::f64::consts::PI).unwrap()
}

/// Arithmetic mean of a slice of values.
///
/// If the slice is empty `None` is returned.
pub fn mean<T>(values: &[T]) -> Option<T>
where
    T: Float + std::ops::AddAssign,
{
    if values.is_empty() {
        return None;
    }

    let mut sum = T::zero();

    for v in values {
        sum += *v;
    }

    Some(sum / T::from(values.len()).unwrap())
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(&20f64, &-15f64, &15f64), 15f64);
        assert_eq!(clamp(&-20f64, &-15f64, &15f64), -15f64);
        assert_eq!(clamp(&3f64, &-15f64, &15f64), 3f64);
    }

    #[test]
    fn test_deg_rad_round_trip() {
        const PI: f64 = std::f64::consts::PI;

        assert!((deg_to_rad(180f64) - PI).abs() < 1e-12);
        assert!((rad_to_deg(PI) - 180f64).abs() < 1e-12);
        assert!((rad_to_deg(deg_to_rad(37.5f64)) - 37.5).abs() < 1e-12);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean::<f64>(&[]), None);
        assert_eq!(mean(&[2f64, 4f64]), Some(3f64));
        assert_eq!(mean(&[-1f64, 1f64]), Some(0f64));
    }
}
