//! Navigation control module
//!
//! NavCtrl turns each cycle's perception observations into actuation demands for the
//! simulation. The rover moves through four modes: driving forward over navigable terrain,
//! stopping when the way ahead closes, approaching a detected sample, and reversing out of a
//! stall.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod mode;
mod params;
mod state;
mod target;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use mode::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during NavCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error("NavCtrl has not been initialised")]
    NotInitialised,
}
