//! # Data Store

use image::RgbImage;
use log::{info, warn};

use crate::map::WorldMap;
use crate::nav;
use sim_if::dems::RoverDems;
use sim_if::telem::RoverTelem;

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Gives the reason the rover has been put into safe mode
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SafeModeCause {
    TelemStale,
    PerFault,
    DemsLinkDown,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Session elapsed time
    pub sim_time_s: f64,

    // Safe mode variables
    /// Determines if the rover is in safe mode.
    pub safe: bool,

    /// Gives the reason for the rover being in safe mode.
    pub safe_cause: Option<SafeModeCause>,

    // Telemetry
    /// The most recent telemetry received from the simulation.
    pub latest_telem: Option<RoverTelem>,

    // Perception
    pub world_map: WorldMap,
    pub per_overlay: Option<RgbImage>,

    // NavCtrl
    pub nav_ctrl: nav::NavCtrl,
    pub nav_input: nav::NavInput,
    pub nav_dems: RoverDems,
    pub nav_status_rpt: nav::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Number of consecutive demand send errors
    pub num_consec_dems_errors: u64,

    /// Number of cycles since telemetry last arrived
    pub cycles_since_telem: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Puts the rover into safe mode with the given cause.
    ///
    /// In safe mode the demands are pinned to NavCtrl's safing demands, which stop the rover.
    pub fn make_safe(&mut self, cause: SafeModeCause) {
        if !self.safe {
            warn!("Make safe requested, cause: {:?}", cause);
            self.safe = true;
            self.safe_cause = Some(cause);

            self.nav_dems = self.nav_ctrl.safe_dems();
        }
    }

    /// Attempts to disable the safe mode by clearing the given cause.
    ///
    /// Returns `Ok(())` if this cause was cleared and safe mode was disabled, or `Err(())`
    /// otherwise. To remove safe mode the provided cause must match the initial reason for safe
    /// mode being enabled.
    ///
    /// If safe mode was not enabled `Ok(())` is returned
    pub fn make_unsafe(&mut self, cause: SafeModeCause) -> Result<(), ()> {
        if !self.safe {
            return Ok(());
        }

        match self.safe_cause {
            Some(root_cause) => {
                if cause == root_cause {
                    self.safe = false;
                    self.safe_cause = None;
                    info!("Make unsafe requested, root cause match, safe mode disabled");
                    Ok(())
                } else {
                    Err(())
                }
            }
            None => Ok(()),
        }
    }

    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        if self.num_cycles % (cycle_frequency_hz as u128) == 0 {
            self.is_1_hz_cycle = true;
        } else {
            self.is_1_hz_cycle = false;
        }

        self.nav_input = nav::NavInput::default();
        self.nav_dems = RoverDems::default();
        self.nav_status_rpt = nav::StatusReport::default();
        self.per_overlay = None;

        self.sim_time_s = util::session::get_elapsed_seconds();
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_make_safe_pins_safing_dems() {
        let mut ds = DataStore::default();

        ds.make_safe(SafeModeCause::TelemStale);

        assert!(ds.safe);
        assert_eq!(ds.safe_cause, Some(SafeModeCause::TelemStale));
        assert_eq!(ds.nav_dems.throttle, 0.0);
        assert!(ds.nav_dems.brake > 0.0);
    }

    #[test]
    fn test_make_safe_keeps_root_cause() {
        let mut ds = DataStore::default();

        ds.make_safe(SafeModeCause::TelemStale);
        ds.make_safe(SafeModeCause::DemsLinkDown);

        assert_eq!(ds.safe_cause, Some(SafeModeCause::TelemStale));
    }

    #[test]
    fn test_make_unsafe_requires_root_cause() {
        let mut ds = DataStore::default();
        ds.make_safe(SafeModeCause::PerFault);

        assert_eq!(ds.make_unsafe(SafeModeCause::TelemStale), Err(()));
        assert!(ds.safe);

        assert_eq!(ds.make_unsafe(SafeModeCause::PerFault), Ok(()));
        assert!(!ds.safe);
        assert_eq!(ds.safe_cause, None);
    }

    #[test]
    fn test_make_unsafe_without_safe_mode() {
        let mut ds = DataStore::default();

        assert_eq!(ds.make_unsafe(SafeModeCause::TelemStale), Ok(()));
    }
}
