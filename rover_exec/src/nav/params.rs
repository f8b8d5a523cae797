//! Navigation control parameters
//!
//! This module provides the parameters used by navigation control, which are loaded from the
//! `nav_ctrl.toml` parameter file. The defaults here match that file and are used by tests.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the navigation control module.
#[derive(Debug, Clone, Deserialize)]
pub struct NavParams {
    /// Minimum size of the active observation set for the rover to keep driving forward. Below
    /// this the way ahead is considered closed.
    pub stop_forward: usize,

    /// Minimum size of the active observation set for a stopped rover to pull away again.
    pub go_forward: usize,

    /// Throttle demand applied when driving.
    ///
    /// Units: normalised throttle
    pub throttle_set: f64,

    /// Brake demand applied when stopping.
    ///
    /// Units: simulation brake units
    pub brake_set: f64,

    /// Speed above which the throttle is released to coast.
    ///
    /// Units: m/s
    pub max_vel_mps: f64,

    /// Speed below which a braking rover is considered to have settled.
    ///
    /// Units: m/s
    pub settled_vel_mps: f64,

    /// Speed the rover creeps at while approaching a sample.
    ///
    /// Units: m/s
    pub approach_slow_vel_mps: f64,

    /// Speed at or below which an applied throttle is considered to be stalled.
    ///
    /// Units: m/s
    pub stall_vel_mps: f64,

    /// Largest steer demand magnitude the rover will command.
    ///
    /// Units: degrees
    pub steer_limit_deg: f64,

    /// Largest magnitude of the random steer perturbation, as an integer percentage of the steer
    /// demand it is applied to.
    ///
    /// Units: percent
    pub steer_jitter_max_pct: i64,

    /// Seed for the steer perturbation generator. Random if absent, fix it to make runs
    /// reproducible.
    pub steer_jitter_seed: Option<u64>,

    /// Minimum size of the active observation set for its mean angle to be worth steering by.
    pub min_steer_obs_len: usize,

    /// Number of positive sample mask cells above which a sample is considered detected and
    /// worth approaching.
    pub sample_detect_px_count: usize,

    /// Number of consecutive stalled cycles above which the rover is declared stuck.
    pub stuck_entry_threshold: u64,

    /// Number of cycles of reversing effort spent on each attempt to get unstuck.
    pub stuck_effort_budget: i64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for NavParams {
    fn default() -> Self {
        NavParams {
            stop_forward: 50,
            go_forward: 500,
            throttle_set: 0.2,
            brake_set: 10.0,
            max_vel_mps: 2.0,
            settled_vel_mps: 0.2,
            approach_slow_vel_mps: 0.5,
            stall_vel_mps: 0.1,
            steer_limit_deg: 15.0,
            steer_jitter_max_pct: 5,
            steer_jitter_seed: None,
            min_steer_obs_len: 2,
            sample_detect_px_count: 10,
            stuck_entry_threshold: 100,
            stuck_effort_budget: 100,
        }
    }
}
