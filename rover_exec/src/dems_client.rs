//! # Demands Client
//!
//! This module provides networking abstractions to send actuation demands to the simulation.
//! Demands travel over a request-reply link so that every demand is acknowledged, letting the
//! exec notice a dead simulation and safe the rover.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::params::RoverExecParams;
use sim_if::{
    dems::{DemsMsg, DemsResponse},
    net::{make_socket, zmq, NetError, SocketOptions},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct DemsClient {
    dems_socket: zmq::Socket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum DemsClientError {
    #[error("Socket error: {0}")]
    SocketError(#[from] NetError),

    #[error("Could not send demands to the server: {0}")]
    SendError(zmq::Error),

    #[error("Could not receive a message from the server: {0}")]
    RecvError(zmq::Error),

    #[error("Could not serialize the demands: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not deserialize the response from the server: {0}")]
    DeserializeError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DemsClient {
    /// Create a new instance of the demands client.
    pub fn new(ctx: &zmq::Context, params: &RoverExecParams) -> Result<Self, DemsClientError> {
        // Create the socket options
        let dems_socket_options = SocketOptions {
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: 100,
            send_timeout: 10,
            req_correlate: true,
            req_relaxed: true,
            ..Default::default()
        };

        // Create the socket
        let dems_socket = make_socket(
            ctx,
            zmq::REQ,
            dems_socket_options,
            &params.sim_dems_endpoint,
        )?;

        Ok(Self { dems_socket })
    }

    /// Send demands to the simulation.
    ///
    /// Sends the given demands message to the server. If the server acknowledges the demands
    /// within the configured timeout then `Ok()` is returned, otherwise an `Err()` is returned.
    pub fn send_dems(&mut self, msg: &DemsMsg) -> Result<DemsResponse, DemsClientError> {
        // Serialize the demands
        let dems_str = serde_json::to_string(msg).map_err(DemsClientError::SerializationError)?;

        // Send the demands to the server
        self.dems_socket
            .send(&dems_str, 0)
            .map_err(DemsClientError::SendError)?;

        // Receive response back from the server
        let msg = self.dems_socket.recv_msg(0);

        match msg {
            Ok(m) => serde_json::from_str(m.as_str().unwrap_or(""))
                .map_err(DemsClientError::DeserializeError),
            Err(e) => Err(DemsClientError::RecvError(e)),
        }
    }
}
