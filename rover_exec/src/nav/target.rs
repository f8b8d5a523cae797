//! Target selection for Navigation Control
//!
//! Each cycle the selector decides which observation set the command laws steer by. Forward
//! driving follows the navigable terrain until enough sample pixels appear, at which point the
//! rover locks onto the sample and begins an approach.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use super::{NavCtrl, RoverMode};
use crate::per::PerObs;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl NavCtrl {
    /// Update the active observation set from this cycle's perception output.
    ///
    /// When no new observations arrived this cycle the previous selection stands.
    pub(crate) fn select_target(&mut self, obs: &Option<PerObs>) {
        let obs = match obs {
            Some(obs) => obs,
            None => return,
        };

        match self.mode {
            RoverMode::Forward => {
                if obs.sample_px_count > self.params.sample_detect_px_count {
                    // Enough sample pixels in view to lock on. Keep a snapshot of the sample
                    // observations in case the sample drops out of view during the approach.
                    self.mode = RoverMode::ApproachSample;
                    self.prev_sample_obs = Some(obs.sample.clone());
                    self.active_obs = Some(obs.sample.clone());
                } else {
                    self.active_obs = Some(obs.navigable.clone());
                }
            }
            RoverMode::ApproachSample => {
                if !obs.sample.is_empty() {
                    self.active_obs = Some(obs.sample.clone());
                } else if let Some(ref prev) = self.prev_sample_obs {
                    // Sample out of view, steer by the snapshot from lock on
                    self.active_obs = Some(prev.clone());
                }
            }
            RoverMode::Stop => {
                self.active_obs = Some(obs.navigable.clone());
            }
            // Recovery reverses along the current selection, no update wanted
            RoverMode::Stuck => (),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::per::ObsSet;

    fn obs_set(len: usize, angle_rad: f64) -> ObsSet {
        ObsSet {
            dists_px: vec![10.0; len],
            angles_rad: vec![angle_rad; len],
        }
    }

    fn per_obs(nav_len: usize, sample_len: usize, sample_px_count: usize) -> Option<PerObs> {
        Some(PerObs {
            navigable: obs_set(nav_len, 0.1),
            sample: obs_set(sample_len, -0.2),
            sample_px_count,
        })
    }

    #[test]
    fn test_forward_selects_navigable() {
        let mut ctrl = NavCtrl::default();

        ctrl.select_target(&per_obs(60, 0, 0));

        assert_eq!(ctrl.mode, RoverMode::Forward);
        assert_eq!(ctrl.active_obs, Some(obs_set(60, 0.1)));
        assert!(ctrl.prev_sample_obs.is_none());
    }

    #[test]
    fn test_forward_locks_onto_sample() {
        let mut ctrl = NavCtrl::default();

        ctrl.select_target(&per_obs(60, 3, 11));

        assert_eq!(ctrl.mode, RoverMode::ApproachSample);
        assert_eq!(ctrl.active_obs, Some(obs_set(3, -0.2)));
        assert_eq!(ctrl.prev_sample_obs, Some(obs_set(3, -0.2)));
    }

    #[test]
    fn test_forward_ignores_sparse_sample_pixels() {
        let mut ctrl = NavCtrl::default();

        // Exactly at the detection count is not enough
        ctrl.select_target(&per_obs(60, 3, 10));

        assert_eq!(ctrl.mode, RoverMode::Forward);
        assert_eq!(ctrl.active_obs, Some(obs_set(60, 0.1)));
    }

    #[test]
    fn test_approach_follows_live_sample() {
        let mut ctrl = NavCtrl::default();
        ctrl.mode = RoverMode::ApproachSample;
        ctrl.prev_sample_obs = Some(obs_set(5, 0.3));

        ctrl.select_target(&per_obs(60, 3, 11));

        assert_eq!(ctrl.active_obs, Some(obs_set(3, -0.2)));
    }

    #[test]
    fn test_approach_falls_back_to_snapshot() {
        let mut ctrl = NavCtrl::default();
        ctrl.mode = RoverMode::ApproachSample;
        ctrl.prev_sample_obs = Some(obs_set(5, 0.3));

        ctrl.select_target(&per_obs(60, 0, 0));

        assert_eq!(ctrl.active_obs, Some(obs_set(5, 0.3)));
    }

    #[test]
    fn test_stop_selects_navigable() {
        let mut ctrl = NavCtrl::default();
        ctrl.mode = RoverMode::Stop;

        ctrl.select_target(&per_obs(60, 3, 11));

        assert_eq!(ctrl.active_obs, Some(obs_set(60, 0.1)));
    }

    #[test]
    fn test_stuck_keeps_selection() {
        let mut ctrl = NavCtrl::default();
        ctrl.mode = RoverMode::Stuck;
        ctrl.active_obs = Some(obs_set(7, 0.2));

        ctrl.select_target(&per_obs(60, 3, 11));

        assert_eq!(ctrl.active_obs, Some(obs_set(7, 0.2)));
    }

    #[test]
    fn test_no_observations_keeps_selection() {
        let mut ctrl = NavCtrl::default();
        ctrl.active_obs = Some(obs_set(7, 0.2));

        ctrl.select_target(&None);

        assert_eq!(ctrl.active_obs, Some(obs_set(7, 0.2)));
    }
}
