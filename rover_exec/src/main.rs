//! Main rover executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Telemetry acquisition from the simulation
//!         - Perception processing of the camera frame
//!         - Navigation control processing
//!         - Demand dispatch back to the simulation
//!
//! The loop runs at a fixed 10 Hz rate. Telemetry arrives asynchronously on the SimClient's
//! background thread, so each cycle works on the newest frame available, or on none at all if
//! the simulation has not published since the last cycle.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use rover_lib::{
    data_store::{DataStore, SafeModeCause},
    dems_client::{DemsClient, DemsClientError},
    map::{WorldMap, WorldMapLayer},
    params::RoverExecParams,
    per::{PerError, PerMgr, PerParams},
    sim_client::{self, SimClient},
};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{error, info, warn};
use std::thread;
use std::time::{Duration, Instant};

// Internal
use sim_if::{
    dems::{DemsMsg, DemsResponse},
    net::zmq,
    telem::{CamFrame, ImageFormat},
};
use util::{
    archive::Archived,
    logger::{logger_init, LevelFilter},
    module::State,
    raise_error,
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.10;

/// Number of cycles per second
const CYCLE_FREQUENCY_HZ: f64 = 1.0 / CYCLE_PERIOD_S;

/// Limit of the number of times receive errors from the demands link can occur consecutively
/// before safe mode will be engaged.
const MAX_DEMS_RECV_ERROR_LIMIT: u64 = 5;

/// Limit of the number of consecutive cycle overruns before the exec gives up.
const MAX_CONSEC_CYCLE_OVERRUNS: u64 = 500;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("rover_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Sample Return Rover Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: RoverExecParams =
        util::params::load("rover_exec.toml").wrap_err("Could not load exec params")?;

    let per_params: PerParams =
        util::params::load("per_mgr.toml").wrap_err("Could not load perception params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    let per_mgr = PerMgr::new(per_params).wrap_err("Failed to initialise PerMgr")?;
    ds.world_map = WorldMap::new(per_mgr.params.world_size);
    info!("PerMgr init complete");

    ds.nav_ctrl
        .init("nav_ctrl.toml", &session)
        .wrap_err("Failed to initialise NavCtrl")?;
    info!("NavCtrl init complete");

    info!("Module initialisation complete\n");

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = zmq::Context::new();

    SimClient::init(&zmq_ctx, &exec_params).wrap_err("Failed to initialise SimClient")?;
    info!("SimClient initialised");

    let mut dems_client =
        DemsClient::new(&zmq_ctx, &exec_params).wrap_err("Failed to initialise DemsClient")?;
    info!("DemsClient initialised");

    info!("Network initialisation complete");

    // Number of cycles without a telemetry frame before the rover is safed
    let telem_timeout_cycles = (exec_params.telem_timeout_s * CYCLE_FREQUENCY_HZ) as u64;

    // ---- MAIN LOOP ----

    info!("Beginning main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(CYCLE_FREQUENCY_HZ);

        // ---- DATA INPUT ----

        let frame = sim_client::latest_frame();

        match frame {
            Some(ref f) => {
                ds.cycles_since_telem = 0;
                ds.latest_telem = Some(f.telem);
                ds.make_unsafe(SafeModeCause::TelemStale).ok();
            }
            None => {
                ds.cycles_since_telem += 1;

                if ds.cycles_since_telem > telem_timeout_cycles {
                    if !ds.safe {
                        error!(
                            "No telemetry from the simulation for {} cycles",
                            ds.cycles_since_telem
                        );
                    }
                    ds.make_safe(SafeModeCause::TelemStale);
                }
            }
        }

        // ---- PERCEPTION PROCESSING ----

        if let Some(ref f) = frame {
            match f.cam_frame.to_rgb_image() {
                Ok(image) => match per_mgr.process(&image, &f.telem, &mut ds.world_map) {
                    Ok(output) => {
                        ds.per_overlay = Some(output.overlay);
                        ds.nav_input.obs = Some(output.obs);
                        ds.make_unsafe(SafeModeCause::PerFault).ok();
                    }
                    Err(e @ PerError::FrameGeomMismatch { .. }) => {
                        // Wrong geometry never fixes itself, the calibration does not match
                        // the simulation
                        if !ds.safe {
                            error!("Perception error: {}", e);
                        }
                        ds.make_safe(SafeModeCause::PerFault);
                    }
                    Err(e) => warn!("Perception error: {}", e),
                },
                Err(e) => warn!("Could not decode the camera frame: {}", e),
            }
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        // NavCtrl processing, skipped until the first telemetry arrives and while safed
        if !ds.safe {
            if let Some(telem) = ds.latest_telem {
                ds.nav_input.telem = telem;
                ds.nav_input.elapsed_s = ds.sim_time_s;

                match ds.nav_ctrl.proc(&ds.nav_input) {
                    Ok((dems, report)) => {
                        ds.nav_dems = dems;
                        ds.nav_status_rpt = report;
                    }
                    Err(e) => warn!("Error during NavCtrl processing: {}", e),
                }
            }
        }

        // ---- DEMAND DISPATCH ----

        // No point commanding a simulation that has never been heard from
        if ds.latest_telem.is_some() {
            let dems = if ds.safe {
                ds.nav_ctrl.safe_dems()
            } else {
                ds.nav_dems
            };

            let vision_frame = match ds.per_overlay {
                Some(ref overlay) => {
                    let encoded = CamFrame::from_rgb_image(
                        overlay.clone(),
                        ImageFormat::Png,
                        chrono::Utc::now(),
                    );

                    match encoded {
                        Ok(f) => Some(f),
                        Err(e) => {
                            warn!("Could not encode the vision overlay: {}", e);
                            None
                        }
                    }
                }
                None => None,
            };

            let msg = DemsMsg { dems, vision_frame };

            match dems_client.send_dems(&msg) {
                Ok(DemsResponse::DemsOk) => {
                    ds.make_unsafe(SafeModeCause::DemsLinkDown).ok();

                    // Reset the receive error counter
                    ds.num_consec_dems_errors = 0;
                }
                Ok(r) => warn!("Received non-nominal response from the simulation: {:?}", r),
                Err(DemsClientError::RecvError(_)) => {
                    ds.num_consec_dems_errors += 1;

                    // If over the limit print error and enter safe mode
                    if ds.num_consec_dems_errors > MAX_DEMS_RECV_ERROR_LIMIT {
                        if !ds.safe {
                            error!(
                                "Maximum number of demand receive errors ({}) has been exceeded",
                                MAX_DEMS_RECV_ERROR_LIMIT
                            );
                        }
                        ds.make_safe(SafeModeCause::DemsLinkDown);
                    }
                }
                Err(e) => warn!("DemsClient processing error: {}", e),
            }
        }

        // ---- WRITE ARCHIVES ----

        if let Err(e) = ds.nav_ctrl.write() {
            warn!("Could not write NavCtrl archives: {}", e);
        }

        // ---- PERIODIC REPORTING ----

        if ds.is_1_hz_cycle {
            session::save("world_map.json", ds.world_map.clone());

            info!(
                "Cycle {}: [{}] {} samples collected, map peaks: obstacle {}, sample {}, navigable {}",
                ds.num_cycles,
                ds.nav_status_rpt.mode,
                ds.latest_telem.map(|t| t.samples_collected).unwrap_or(0),
                ds.world_map.layer_max(WorldMapLayer::Obstacle),
                ds.world_map.layer_max(WorldMapLayer::Sample),
                ds.world_map.layer_max(WorldMapLayer::Navigable),
            );
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
                ds.num_consec_cycle_overruns += 1;

                if ds.num_consec_cycle_overruns > MAX_CONSEC_CYCLE_OVERRUNS {
                    raise_error!(
                        "More than {} consecutive cycle overruns!",
                        MAX_CONSEC_CYCLE_OVERRUNS
                    );
                }
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;
    }
}
