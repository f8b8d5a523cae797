//! Rover operating modes

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use std::fmt;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Top level operating mode of the rover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RoverMode {
    /// Driving over open terrain.
    Forward,

    /// Braking to a halt, or turning on the spot looking for a way forward.
    Stop,

    /// Creeping up on a detected sample.
    ApproachSample,

    /// Grounded against terrain, backing out.
    Stuck,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for RoverMode {
    fn default() -> Self {
        RoverMode::Forward
    }
}

impl fmt::Display for RoverMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RoverMode::Forward => write!(f, "FORWARD"),
            RoverMode::Stop => write!(f, "STOP"),
            RoverMode::ApproachSample => write!(f, "APPROACH_SAMPLE"),
            RoverMode::Stuck => write!(f, "STUCK"),
        }
    }
}
