//! # Rover Executable Parameters
//!
//! This module provides parameters for the rover executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
pub struct RoverExecParams {
    /// Network endpoint the simulation publishes telemetry frames on
    pub sim_telem_endpoint: String,

    /// Network endpoint for the simulation demands socket
    pub sim_dems_endpoint: String,

    /// Time without a telemetry frame after which the rover is safed.
    ///
    /// Units: seconds
    pub telem_timeout_s: f64,
}
