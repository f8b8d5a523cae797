//! # Simulation Client
//!
//! The SimClient receives telemetry from the rover simulation. The simulation publishes a
//! [`TelemFrame`] containing the rover state and the latest front camera frame as often as it
//! can, and this client keeps only the newest one in a mailbox.
//!
//! The data provided by the system works in a publisher-subscriber model. Unlike the demands
//! link there is no handshake, a slow consumer simply skips frames. The simulation server is
//! written in Python so the wire format is plain JSON.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
};

use conquer_once::Lazy;
use log::{error, warn};

use crate::params::RoverExecParams;
use sim_if::{
    net::{make_socket, zmq, NetError, SocketOptions},
    telem::TelemFrame,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct SimClient {
    bg_jh: Option<JoinHandle<()>>,
    bg_run: Arc<AtomicBool>,
    latest_frame: Arc<Mutex<Option<TelemFrame>>>,
}

// ------------------------------------------------------------------------------------------------
// GLOBALS
// ------------------------------------------------------------------------------------------------

static SIM_CLIENT: Lazy<Mutex<Option<SimClient>>> = Lazy::new(|| Mutex::new(None));

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SimClientError {
    #[error("Socket error: {0}")]
    SocketError(#[from] NetError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimClient {
    /// Create a new instance of the SimClient.
    pub fn init(ctx: &zmq::Context, params: &RoverExecParams) -> Result<(), SimClientError> {
        // Create the socket options
        let socket_options = SocketOptions {
            subscribe: Some(vec![]),
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: 10,
            send_timeout: 10,
            ..Default::default()
        };

        // Connect the socket
        let socket = make_socket(ctx, zmq::SUB, socket_options, &params.sim_telem_endpoint)?;

        // Create the data shared objects
        let bg_run = Arc::new(AtomicBool::new(true));
        let latest_frame = Arc::new(Mutex::new(None));

        // Create clones of these to pass to the bg thread
        let bg_run_clone = bg_run.clone();
        let latest_frame_clone = latest_frame.clone();

        // Start BG thread
        let bg_jh = Some(thread::spawn(move || {
            bg_thread(socket, bg_run_clone, latest_frame_clone)
        }));

        // Set the global
        *SIM_CLIENT.lock().expect("SIM_CLIENT mutex poisoned") = Some(Self {
            bg_jh,
            bg_run,
            latest_frame,
        });

        // Return success
        Ok(())
    }

    /// Take the newest telemetry frame out of the mailbox.
    ///
    /// Each frame is handed out at most once, so `None` means nothing new has arrived since the
    /// last call.
    pub fn take_frame(&self) -> Option<TelemFrame> {
        let mut frame = self
            .latest_frame
            .lock()
            .expect("SimClient: latest_frame mutex poisoned");

        frame.take()
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Take the newest telemetry frame from the simulation.
pub fn latest_frame() -> Option<TelemFrame> {
    match *SIM_CLIENT.lock().expect("SIM_CLIENT mutex poisoned") {
        Some(ref c) => c.take_frame(),
        None => None,
    }
}

/// Background thread, updates the mailbox when the simulation publishes a new frame.
fn bg_thread(
    socket: zmq::Socket,
    run: Arc<AtomicBool>,
    latest_frame: Arc<Mutex<Option<TelemFrame>>>,
) {
    // While instructed to run
    while run.load(Ordering::Relaxed) {
        // Read string from the socket
        let msg = match socket.recv_string(0) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => {
                warn!("Non UTF-8 message from the simulation");
                continue;
            }
            Err(zmq::Error::EAGAIN) => continue,
            Err(e) => {
                error!("Error receiving message from the simulation: {:?}", e);
                break;
            }
        };

        // Deserialize the message
        let frame: TelemFrame = match serde_json::from_str(&msg) {
            Ok(f) => f,
            Err(e) => {
                warn!("Error deserialising message from the simulation: {:?}", e);
                continue;
            }
        };

        // Replace whatever is in the mailbox, a missed frame is stale anyway
        {
            let mut lf = latest_frame
                .lock()
                .expect("SimClient: latest_frame mutex poisoned");

            *lf = Some(frame);
        }
    }
}
