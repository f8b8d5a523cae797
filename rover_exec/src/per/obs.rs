//! Rover-centric polar terrain observations.
//!
//! An [`ObsSet`] is the polar form of the positive cells of one classification mask. The
//! navigation module steers off the mean observation angle and gates its transitions on the
//! number of observations, so the sets keep distances and angles as parallel sequences rather
//! than as a struct-per-cell.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use util::maths;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A set of terrain observations in rover-centric polar form.
///
/// Distances are in rectified-image pixel units, angles in radians anticlockwise from the
/// rover's forward axis. The sequences are parallel: entry `i` of each describes the same
/// classified cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObsSet {
    /// Distance from the rover's ground contact point to each cell. Units: rectified pixels.
    pub dists_px: Vec<f64>,

    /// Bearing of each cell. Units: radians, positive to the rover's left.
    pub angles_rad: Vec<f64>,
}

/// The observation sets produced by a single perception pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerObs {
    /// Observations of navigable terrain.
    pub navigable: ObsSet,

    /// Observations of rock samples.
    pub sample: ObsSet,

    /// Number of positive cells in the sample mask, before any transforms.
    pub sample_px_count: usize,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ObsSet {
    /// Returns the number of observations in the set.
    pub fn len(&self) -> usize {
        self.angles_rad.len()
    }

    /// Returns true if the set contains no observations.
    pub fn is_empty(&self) -> bool {
        self.angles_rad.is_empty()
    }

    /// Returns the mean observation angle in degrees, or `None` if the set is empty.
    pub fn mean_angle_deg(&self) -> Option<f64> {
        maths::mean(&self.angles_rad).map(maths::rad_to_deg)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mean_angle() {
        let obs = ObsSet {
            dists_px: vec![1.0, 1.0],
            angles_rad: vec![0.2, 0.4],
        };

        let mean = obs.mean_angle_deg().unwrap();
        assert!((mean - 0.3f64.to_degrees()).abs() < 1e-9);
    }

    #[test]
    fn test_empty_set() {
        let obs = ObsSet::default();

        assert!(obs.is_empty());
        assert_eq!(obs.len(), 0);
        assert_eq!(obs.mean_angle_deg(), None);
    }
}
