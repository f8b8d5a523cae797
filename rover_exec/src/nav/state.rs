//! Implementations for the NavCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;

// Internal
use super::{NavError, NavParams, RoverMode};
use crate::per::{ObsSet, PerObs};
use sim_if::dems::RoverDems;
use sim_if::telem::RoverTelem;
use util::{
    archive::{Archived, Archiver},
    maths,
    module::State,
    params,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Navigation control module state
#[derive(Default)]
pub struct NavCtrl {
    pub(crate) params: NavParams,

    /// Steer perturbation generator, populated at init.
    pub(crate) rng: Option<StdRng>,

    pub(crate) mode: RoverMode,

    /// The observation set currently steered by, `None` until perception first provides one.
    pub(crate) active_obs: Option<ObsSet>,

    /// Snapshot of the sample observations which began the current approach.
    pub(crate) prev_sample_obs: Option<ObsSet>,

    /// Number of consecutive cycles the rover has stalled for.
    pub(crate) stuck_count: u64,
    stalled_in_prev_cycle: bool,

    /// Reversing effort remaining in the current stuck recovery attempt.
    pub(crate) effort_count: i64,

    prev_samples_collected: u32,
    send_pickup: bool,

    pub(crate) report: StatusReport,
    arch_report: Archiver,

    pub(crate) output: Option<RoverDems>,
    arch_output: Archiver,
}

/// Input data to Navigation Control.
#[derive(Debug, Clone, Default)]
pub struct NavInput {
    /// Seconds elapsed since the start of the session.
    pub elapsed_s: f64,

    /// Observations from this cycle's perception pass, or `None` if perception produced nothing
    /// this cycle.
    pub obs: Option<PerObs>,

    /// The latest rover telemetry.
    pub telem: RoverTelem,
}

/// Status report for NavCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    pub elapsed_s: f64,
    pub mode: RoverMode,
    pub active_obs_len: usize,
    pub mean_angle_deg: Option<f64>,
    pub stuck_count: u64,
    pub effort_count: i64,
    pub send_pickup: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for NavCtrl {
    type InitData = &'static str;
    type InitError = params::LoadError;

    type InputData = NavInput;
    type OutputData = RoverDems;
    type StatusReport = StatusReport;
    type ProcError = NavError;

    /// Initialise the NavCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(
        &mut self,
        init_data: Self::InitData,
        session: &Session,
    ) -> Result<(), Self::InitError> {
        // Load the parameters
        self.params = params::load(init_data)?;

        // Create the arch folder for nav_ctrl
        let mut arch_path = session.arch_root.clone();
        arch_path.push("nav_ctrl");
        std::fs::create_dir_all(arch_path).unwrap();

        // Initialise the archivers
        self.arch_report = Archiver::from_path(session, "nav_ctrl/status_report.csv").unwrap();
        self.arch_output = Archiver::from_path(session, "nav_ctrl/output.csv").unwrap();

        self.rng = Some(match self.params.steer_jitter_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        });

        self.effort_count = self.params.stuck_effort_budget;

        Ok(())
    }

    /// Perform cyclic processing of Navigation Control.
    ///
    /// Selects the observation set to steer by, runs the mode specific command law, and then
    /// applies the pickup and stall arbitration which run every cycle regardless of mode.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        if self.rng.is_none() {
            return Err(NavError::NotInitialised);
        }

        // Clear the status report
        self.report = StatusReport::default();

        self.select_target(&input_data.obs);

        let obs_stats = self
            .active_obs
            .as_ref()
            .map(|obs| (obs.len(), obs.mean_angle_deg().unwrap_or(0.0)));

        let mut dems = match obs_stats {
            Some((obs_len, mean_angle_deg)) => match self.mode {
                RoverMode::Forward => {
                    self.drive_forward(obs_len, mean_angle_deg, &input_data.telem)
                }
                RoverMode::Stop => {
                    self.hold_until_clear(obs_len, mean_angle_deg, &input_data.telem)
                }
                RoverMode::ApproachSample => {
                    self.approach_sample(obs_len, mean_angle_deg, &input_data.telem)
                }
                RoverMode::Stuck => self.reverse_out(obs_len, mean_angle_deg),
            },
            // No observations have ever been made, drive gently forward until some arrive
            None => RoverDems {
                throttle: self.params.throttle_set,
                ..RoverDems::default()
            },
        };

        self.arbitrate_pickup(&input_data.telem, &mut dems);
        self.detect_stuck(&input_data.telem, &dems);

        trace!(
            "NavCtrl [{}] dems: throttle {:.2}, brake {:.2}, steer {:.1} deg, pickup {}",
            self.mode,
            dems.throttle,
            dems.brake,
            dems.steer_deg,
            dems.send_pickup
        );

        self.report.elapsed_s = input_data.elapsed_s;
        self.report.mode = self.mode;
        self.report.active_obs_len = self.active_obs.as_ref().map(ObsSet::len).unwrap_or(0);
        self.report.mean_angle_deg = self.active_obs.as_ref().and_then(ObsSet::mean_angle_deg);
        self.report.stuck_count = self.stuck_count;
        self.report.effort_count = self.effort_count;
        self.report.send_pickup = dems.send_pickup;

        self.output = Some(dems);

        Ok((dems, self.report))
    }
}

impl Archived for NavCtrl {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_report.serialise(self.report)?;
        self.arch_output.serialise(self.output)?;

        Ok(())
    }
}

impl NavCtrl {
    /// Demands which bring the rover to an immediate controlled stop.
    pub fn safe_dems(&self) -> RoverDems {
        RoverDems {
            throttle: 0.0,
            brake: self.params.brake_set,
            steer_deg: 0.0,
            send_pickup: false,
        }
    }

    /// Drive over open terrain, stopping if the way ahead closes up.
    fn drive_forward(
        &mut self,
        obs_len: usize,
        mean_angle_deg: f64,
        telem: &RoverTelem,
    ) -> RoverDems {
        if obs_len >= self.params.stop_forward {
            // Throttle up to the speed limit, coast above it
            let throttle = if telem.vel_mps < self.params.max_vel_mps {
                self.params.throttle_set
            } else {
                0.0
            };

            RoverDems {
                throttle,
                brake: 0.0,
                steer_deg: self.jittered_steer(mean_angle_deg),
                ..RoverDems::default()
            }
        } else {
            debug!("Way ahead closed ({} obs), stopping", obs_len);
            self.mode = RoverMode::Stop;

            RoverDems {
                throttle: 0.0,
                brake: self.params.brake_set,
                steer_deg: 0.0,
                ..RoverDems::default()
            }
        }
    }

    /// Brake to a halt, then turn on the spot until the way ahead opens up again.
    fn hold_until_clear(
        &mut self,
        obs_len: usize,
        mean_angle_deg: f64,
        telem: &RoverTelem,
    ) -> RoverDems {
        if telem.vel_mps > self.params.settled_vel_mps {
            // Still rolling, keep braking
            return RoverDems {
                throttle: 0.0,
                brake: self.params.brake_set,
                steer_deg: 0.0,
                ..RoverDems::default()
            };
        }

        if obs_len < self.params.go_forward {
            // Turn in place with the brake off. The turn direction is fixed, there is no
            // preference logic.
            RoverDems {
                throttle: 0.0,
                brake: 0.0,
                steer_deg: -self.params.steer_limit_deg,
                ..RoverDems::default()
            }
        } else {
            debug!("Way ahead open again ({} obs), pulling away", obs_len);
            self.mode = RoverMode::Forward;

            let limit = self.params.steer_limit_deg;

            RoverDems {
                throttle: self.params.throttle_set,
                brake: 0.0,
                steer_deg: maths::clamp(&mean_angle_deg, &-limit, &limit),
                ..RoverDems::default()
            }
        }
    }

    /// Creep up on the targeted sample and stop dead beside it.
    fn approach_sample(
        &mut self,
        obs_len: usize,
        mean_angle_deg: f64,
        telem: &RoverTelem,
    ) -> RoverDems {
        let limit = self.params.steer_limit_deg;

        if obs_len >= self.params.min_steer_obs_len {
            let steer_deg = maths::clamp(&mean_angle_deg, &-limit, &limit);

            if telem.vel_mps < self.params.approach_slow_vel_mps {
                RoverDems {
                    throttle: self.params.throttle_set,
                    brake: 0.0,
                    steer_deg,
                    ..RoverDems::default()
                }
            } else {
                // Soft braking, a full brake here would park the rover short of the sample
                RoverDems {
                    throttle: 0.0,
                    brake: self.params.brake_set / 5.0,
                    steer_deg,
                    ..RoverDems::default()
                }
            }
        } else if !telem.near_sample {
            // Sample out of view but not yet in reach, creep straight on
            RoverDems {
                throttle: self.params.throttle_set,
                brake: 0.0,
                steer_deg: 0.0,
                ..RoverDems::default()
            }
        } else {
            RoverDems {
                throttle: 0.0,
                brake: self.params.brake_set,
                steer_deg: 0.0,
                ..RoverDems::default()
            }
        }
    }

    /// Back away from whatever the rover has grounded on, steering opposite to the observed
    /// heading, until the effort budget runs out.
    fn reverse_out(&mut self, obs_len: usize, mean_angle_deg: f64) -> RoverDems {
        let limit = self.params.steer_limit_deg;

        if self.effort_count >= 0 {
            self.effort_count -= 1;

            let steer_deg = if obs_len > self.params.min_steer_obs_len {
                -maths::clamp(&mean_angle_deg, &-limit, &limit)
            } else {
                -limit
            };

            RoverDems {
                throttle: -self.params.throttle_set,
                brake: 0.0,
                steer_deg,
                ..RoverDems::default()
            }
        } else {
            info!("Stuck recovery effort spent, trying forward again");
            self.effort_count = self.params.stuck_effort_budget;
            self.mode = RoverMode::Forward;

            RoverDems {
                throttle: self.params.throttle_set,
                brake: 0.0,
                steer_deg: 0.0,
                ..RoverDems::default()
            }
        }
    }

    /// Raise and clear the sample pickup signal.
    ///
    /// The signal is raised while the rover stands exactly still within reach of a sample with
    /// no pickup already running, and cleared once the collected count increases, at which point
    /// the rover is forced into stop mode.
    fn arbitrate_pickup(&mut self, telem: &RoverTelem, dems: &mut RoverDems) {
        // Exact zero, the simulation reports a true standstill
        if telem.near_sample && telem.vel_mps == 0.0 && !telem.picking_up {
            if !self.send_pickup {
                info!("Sample in reach and rover stationary, requesting pickup");
            }
            self.send_pickup = true;
        } else if telem.samples_collected != self.prev_samples_collected {
            info!("Sample collected, {} in total", telem.samples_collected);
            self.send_pickup = false;
            self.prev_samples_collected = telem.samples_collected;
            self.mode = RoverMode::Stop;
        }

        dems.send_pickup = self.send_pickup;
    }

    /// Watch for the rover stalling, and start stuck recovery when a stall persists.
    ///
    /// A stall is an applied throttle with no movement. Stop mode is exempt, holding station
    /// against the brake is not a stall.
    fn detect_stuck(&mut self, telem: &RoverTelem, dems: &RoverDems) {
        if self.mode == RoverMode::Stop {
            return;
        }

        if telem.vel_mps <= self.params.stall_vel_mps && dems.throttle > 0.0 {
            if !self.stalled_in_prev_cycle && self.stuck_count == 0 {
                // First stalled cycle of a streak
                self.stuck_count += 1;
                self.stalled_in_prev_cycle = true;
            } else {
                self.stuck_count += 1;

                if self.stuck_count > self.params.stuck_entry_threshold {
                    warn!(
                        "Rover stalled for {} consecutive cycles, starting stuck recovery",
                        self.stuck_count
                    );
                    self.mode = RoverMode::Stuck;
                    self.effort_count = self.params.stuck_effort_budget;
                    self.stuck_count = 0;
                    self.stalled_in_prev_cycle = false;
                }
            }
        } else {
            self.stuck_count = 0;
            self.stalled_in_prev_cycle = false;
        }
    }

    /// Clamp a steer demand to the limit and spread it by the random perturbation, which stops
    /// the rover orbiting endlessly around one patch of open terrain.
    fn jittered_steer(&mut self, mean_angle_deg: f64) -> f64 {
        let limit = self.params.steer_limit_deg;
        let steer_deg = maths::clamp(&mean_angle_deg, &-limit, &limit);

        let jitter_pct = match self.rng.as_mut() {
            Some(rng) => {
                rng.gen_range(-self.params.steer_jitter_max_pct..=self.params.steer_jitter_max_pct)
            }
            None => 0,
        };

        steer_deg + steer_deg * jitter_pct as f64 / 100.0
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    /// An initialised controller with the steer perturbation disabled so that steer demands are
    /// exact.
    fn test_ctrl() -> NavCtrl {
        let mut ctrl = NavCtrl::default();
        ctrl.params.steer_jitter_max_pct = 0;
        ctrl.rng = Some(StdRng::seed_from_u64(0));
        ctrl.effort_count = ctrl.params.stuck_effort_budget;
        ctrl
    }

    fn obs_set(len: usize, angle_rad: f64) -> ObsSet {
        ObsSet {
            dists_px: vec![10.0; len],
            angles_rad: vec![angle_rad; len],
        }
    }

    fn nav_input(nav_len: usize, telem: RoverTelem) -> NavInput {
        NavInput {
            elapsed_s: 0.0,
            obs: Some(PerObs {
                navigable: obs_set(nav_len, 0.1),
                sample: ObsSet::default(),
                sample_px_count: 0,
            }),
            telem,
        }
    }

    fn telem_at_vel(vel_mps: f64) -> RoverTelem {
        RoverTelem {
            vel_mps,
            ..RoverTelem::default()
        }
    }

    #[test]
    fn test_proc_before_init_rejected() {
        let mut ctrl = NavCtrl::default();

        assert!(matches!(
            ctrl.proc(&NavInput::default()),
            Err(NavError::NotInitialised)
        ));
    }

    #[test]
    fn test_forward_drives_open_terrain() {
        let mut ctrl = test_ctrl();

        let (dems, report) = ctrl.proc(&nav_input(60, telem_at_vel(1.0))).unwrap();

        assert_eq!(dems.throttle, 0.2);
        assert_eq!(dems.brake, 0.0);
        assert!((dems.steer_deg - 0.1f64.to_degrees()).abs() < 1e-9);
        assert_eq!(ctrl.mode, RoverMode::Forward);
        assert_eq!(report.active_obs_len, 60);
    }

    #[test]
    fn test_forward_coasts_at_max_vel() {
        let mut ctrl = test_ctrl();

        let (dems, _) = ctrl.proc(&nav_input(60, telem_at_vel(2.0))).unwrap();

        assert_eq!(dems.throttle, 0.0);
        assert_eq!(dems.brake, 0.0);
    }

    #[test]
    fn test_forward_steer_is_clamped() {
        let mut ctrl = test_ctrl();
        let mut input = nav_input(60, telem_at_vel(1.0));
        input.obs.as_mut().unwrap().navigable = obs_set(60, 0.5);

        let (dems, _) = ctrl.proc(&input).unwrap();

        // 0.5 rad is roughly 28.6 deg, well over the limit
        assert_eq!(dems.steer_deg, 15.0);
    }

    #[test]
    fn test_forward_stops_on_closed_terrain() {
        let mut ctrl = test_ctrl();

        let (dems, _) = ctrl.proc(&nav_input(49, telem_at_vel(1.0))).unwrap();

        assert_eq!(dems.throttle, 0.0);
        assert_eq!(dems.brake, 10.0);
        assert_eq!(dems.steer_deg, 0.0);
        assert_eq!(ctrl.mode, RoverMode::Stop);
    }

    #[test]
    fn test_stop_holds_brake_while_moving() {
        let mut ctrl = test_ctrl();
        ctrl.mode = RoverMode::Stop;

        let (dems, _) = ctrl.proc(&nav_input(499, telem_at_vel(0.3))).unwrap();

        assert_eq!(dems.brake, 10.0);
        assert_eq!(dems.throttle, 0.0);
        assert_eq!(ctrl.mode, RoverMode::Stop);
    }

    #[test]
    fn test_stop_turns_in_place_when_closed() {
        let mut ctrl = test_ctrl();
        ctrl.mode = RoverMode::Stop;

        let (dems, _) = ctrl.proc(&nav_input(499, telem_at_vel(0.1))).unwrap();

        assert_eq!(dems.throttle, 0.0);
        assert_eq!(dems.brake, 0.0);
        assert_eq!(dems.steer_deg, -15.0);
        assert_eq!(ctrl.mode, RoverMode::Stop);
    }

    #[test]
    fn test_stop_pulls_away_when_open() {
        let mut ctrl = test_ctrl();
        ctrl.mode = RoverMode::Stop;

        let (dems, _) = ctrl.proc(&nav_input(500, telem_at_vel(0.1))).unwrap();

        assert_eq!(dems.throttle, 0.2);
        assert_eq!(dems.brake, 0.0);
        assert!((dems.steer_deg - 0.1f64.to_degrees()).abs() < 1e-9);
        assert_eq!(ctrl.mode, RoverMode::Forward);
    }

    #[test]
    fn test_sample_detection_begins_approach() {
        let mut ctrl = test_ctrl();

        let input = NavInput {
            elapsed_s: 0.0,
            obs: Some(PerObs {
                navigable: obs_set(60, 0.1),
                sample: obs_set(3, -0.1),
                sample_px_count: 11,
            }),
            telem: telem_at_vel(0.0),
        };
        let (dems, _) = ctrl.proc(&input).unwrap();

        assert_eq!(ctrl.mode, RoverMode::ApproachSample);
        // Steering by the sample set, not the navigable set
        assert!((dems.steer_deg - (-0.1f64.to_degrees())).abs() < 1e-9);
        assert_eq!(dems.throttle, 0.2);
    }

    #[test]
    fn test_approach_creeps_then_brakes_softly() {
        let mut ctrl = test_ctrl();
        ctrl.mode = RoverMode::ApproachSample;
        ctrl.prev_sample_obs = Some(obs_set(3, -0.1));

        let mut input = nav_input(60, telem_at_vel(0.3));
        input.obs.as_mut().unwrap().sample = obs_set(3, -0.1);

        let (dems, _) = ctrl.proc(&input).unwrap();
        assert_eq!(dems.throttle, 0.2);
        assert_eq!(dems.brake, 0.0);

        input.telem.vel_mps = 0.7;
        let (dems, _) = ctrl.proc(&input).unwrap();
        assert_eq!(dems.throttle, 0.0);
        assert_eq!(dems.brake, 2.0);
        assert!((dems.steer_deg - (-0.1f64.to_degrees())).abs() < 1e-9);
    }

    #[test]
    fn test_approach_falls_back_to_snapshot() {
        let mut ctrl = test_ctrl();
        ctrl.mode = RoverMode::ApproachSample;
        ctrl.prev_sample_obs = Some(obs_set(3, -0.2));

        // Sample mask empty this cycle, the snapshot steers the approach
        let (dems, _) = ctrl.proc(&nav_input(60, telem_at_vel(0.3))).unwrap();

        assert!((dems.steer_deg - (-0.2f64.to_degrees())).abs() < 1e-9);
        assert_eq!(dems.throttle, 0.2);
    }

    #[test]
    fn test_approach_lost_sample_creeps_straight() {
        let mut ctrl = test_ctrl();
        ctrl.mode = RoverMode::ApproachSample;
        ctrl.prev_sample_obs = Some(obs_set(1, -0.1));

        let mut input = nav_input(60, telem_at_vel(0.2));
        input.obs.as_mut().unwrap().sample = obs_set(1, -0.1);

        let (dems, _) = ctrl.proc(&input).unwrap();

        assert_eq!(dems.throttle, 0.2);
        assert_eq!(dems.brake, 0.0);
        assert_eq!(dems.steer_deg, 0.0);
    }

    #[test]
    fn test_approach_stops_beside_sample() {
        let mut ctrl = test_ctrl();
        ctrl.mode = RoverMode::ApproachSample;
        ctrl.prev_sample_obs = Some(obs_set(1, -0.1));

        let mut input = nav_input(60, telem_at_vel(0.0));
        input.obs.as_mut().unwrap().sample = obs_set(1, -0.1);
        input.telem.near_sample = true;

        let (dems, _) = ctrl.proc(&input).unwrap();

        assert_eq!(dems.throttle, 0.0);
        assert_eq!(dems.brake, 10.0);
        // Stationary within reach, the pickup signal goes up immediately
        assert!(dems.send_pickup);
    }

    #[test]
    fn test_stuck_reverses_and_steers_away() {
        let mut ctrl = test_ctrl();
        ctrl.mode = RoverMode::Stuck;
        ctrl.active_obs = Some(obs_set(10, 0.1));
        ctrl.effort_count = 5;

        let input = NavInput {
            obs: None,
            telem: telem_at_vel(0.0),
            elapsed_s: 0.0,
        };
        let (dems, _) = ctrl.proc(&input).unwrap();

        assert_eq!(dems.throttle, -0.2);
        assert_eq!(dems.brake, 0.0);
        assert!((dems.steer_deg - (-0.1f64.to_degrees())).abs() < 1e-9);
        assert_eq!(ctrl.effort_count, 4);
        assert_eq!(ctrl.mode, RoverMode::Stuck);
    }

    #[test]
    fn test_stuck_with_few_obs_steers_hard_over() {
        let mut ctrl = test_ctrl();
        ctrl.mode = RoverMode::Stuck;
        ctrl.active_obs = Some(obs_set(2, 0.1));
        ctrl.effort_count = 5;

        let input = NavInput {
            obs: None,
            telem: telem_at_vel(0.0),
            elapsed_s: 0.0,
        };
        let (dems, _) = ctrl.proc(&input).unwrap();

        assert_eq!(dems.steer_deg, -15.0);
    }

    #[test]
    fn test_stuck_exhausted_tries_forward_again() {
        let mut ctrl = test_ctrl();
        ctrl.mode = RoverMode::Stuck;
        ctrl.active_obs = Some(obs_set(10, 0.1));
        ctrl.effort_count = -1;

        let input = NavInput {
            obs: None,
            telem: telem_at_vel(0.0),
            elapsed_s: 0.0,
        };
        let (dems, _) = ctrl.proc(&input).unwrap();

        assert_eq!(dems.throttle, 0.2);
        assert_eq!(dems.steer_deg, 0.0);
        assert_eq!(ctrl.mode, RoverMode::Forward);
        assert_eq!(ctrl.effort_count, 100);
    }

    #[test]
    fn test_persistent_stall_enters_stuck() {
        let mut ctrl = test_ctrl();
        let input = nav_input(60, telem_at_vel(0.0));

        // Forward mode commands throttle, the rover never moves
        for _ in 0..100 {
            ctrl.proc(&input).unwrap();
            assert_eq!(ctrl.mode, RoverMode::Forward);
        }
        assert_eq!(ctrl.stuck_count, 100);

        ctrl.proc(&input).unwrap();

        assert_eq!(ctrl.mode, RoverMode::Stuck);
        assert_eq!(ctrl.stuck_count, 0);
        assert_eq!(ctrl.effort_count, 100);
    }

    #[test]
    fn test_movement_resets_stall_count() {
        let mut ctrl = test_ctrl();

        for _ in 0..50 {
            ctrl.proc(&nav_input(60, telem_at_vel(0.0))).unwrap();
        }
        assert_eq!(ctrl.stuck_count, 50);

        ctrl.proc(&nav_input(60, telem_at_vel(1.0))).unwrap();

        assert_eq!(ctrl.stuck_count, 0);
        assert_eq!(ctrl.mode, RoverMode::Forward);
    }

    #[test]
    fn test_pickup_signal_held_until_collection() {
        let mut ctrl = test_ctrl();
        ctrl.mode = RoverMode::ApproachSample;
        ctrl.prev_sample_obs = Some(obs_set(1, 0.0));

        let mut input = nav_input(60, telem_at_vel(0.0));
        input.obs.as_mut().unwrap().sample = obs_set(1, 0.0);
        input.telem.near_sample = true;

        let (dems, _) = ctrl.proc(&input).unwrap();
        assert!(dems.send_pickup);

        // The pickup mechanism starts running, the signal holds
        input.telem.picking_up = true;
        let (dems, _) = ctrl.proc(&input).unwrap();
        assert!(dems.send_pickup);

        // Collection complete, the signal clears and the rover is forced to stop
        input.telem.picking_up = false;
        input.telem.near_sample = false;
        input.telem.samples_collected = 1;
        let (dems, _) = ctrl.proc(&input).unwrap();

        assert!(!dems.send_pickup);
        assert_eq!(ctrl.mode, RoverMode::Stop);
    }

    #[test]
    fn test_post_pickup_stop_skips_stall_detection() {
        let mut ctrl = test_ctrl();
        ctrl.mode = RoverMode::ApproachSample;
        ctrl.prev_sample_obs = Some(obs_set(1, 0.0));

        // Creep throttle with zero velocity would count as a stall, but the collection forces
        // stop mode before the stall detector runs
        let mut input = nav_input(60, telem_at_vel(0.0));
        input.obs.as_mut().unwrap().sample = obs_set(1, 0.0);
        input.telem.samples_collected = 1;

        ctrl.proc(&input).unwrap();

        assert_eq!(ctrl.mode, RoverMode::Stop);
        assert_eq!(ctrl.stuck_count, 0);
    }

    #[test]
    fn test_no_observations_drives_safe_default() {
        let mut ctrl = test_ctrl();

        let input = NavInput {
            obs: None,
            telem: telem_at_vel(0.0),
            elapsed_s: 0.0,
        };
        let (dems, report) = ctrl.proc(&input).unwrap();

        assert_eq!(dems.throttle, 0.2);
        assert_eq!(dems.brake, 0.0);
        assert_eq!(dems.steer_deg, 0.0);
        assert_eq!(report.active_obs_len, 0);
        // The stall detector still sees the applied throttle
        assert_eq!(ctrl.stuck_count, 1);
    }

    #[test]
    fn test_steer_jitter_stays_within_bounds() {
        let mut ctrl = test_ctrl();
        ctrl.params.steer_jitter_max_pct = 5;
        ctrl.rng = Some(StdRng::seed_from_u64(7));

        let mut input = nav_input(60, telem_at_vel(1.0));
        input.obs.as_mut().unwrap().navigable = obs_set(60, 0.5);

        let mut saw_jitter = false;

        for _ in 0..200 {
            let (dems, _) = ctrl.proc(&input).unwrap();

            // Clamped steer is 15.0, the jitter spreads it by at most 5 percent
            assert!(dems.steer_deg >= 14.25 && dems.steer_deg <= 15.75);
            if dems.steer_deg != 15.0 {
                saw_jitter = true;
            }
        }

        assert!(saw_jitter);
    }

    #[test]
    fn test_report_contents() {
        let mut ctrl = test_ctrl();

        let mut input = nav_input(60, telem_at_vel(1.0));
        input.elapsed_s = 12.5;

        let (_, report) = ctrl.proc(&input).unwrap();

        assert_eq!(report.elapsed_s, 12.5);
        assert_eq!(report.mode, RoverMode::Forward);
        assert_eq!(report.active_obs_len, 60);
        assert!((report.mean_angle_deg.unwrap() - 0.1f64.to_degrees()).abs() < 1e-9);
        assert_eq!(report.stuck_count, 0);
        assert!(!report.send_pickup);
    }
}
