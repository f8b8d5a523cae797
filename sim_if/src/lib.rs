//! # Simulation interface crate.
//!
//! Defines the messages exchanged with the rover simulation server and the
//! networking helpers used to carry them. The server is written in python so
//! the wire format is plain JSON, with camera images travelling as
//! base64-encoded PNG or JPEG data.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Telemetry published by the simulation server
pub mod telem;

/// Actuation demands sent back to the simulation server
pub mod dems;

/// Network module
pub mod net;
