//! # Rover library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to access items
//! defined inside the rover executable crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Global data store - central state shared between modules of the executable
pub mod data_store;

/// Demands client - sends actuation demands to the simulation server
pub mod dems_client;

/// World map - persistent accumulated terrain knowledge
pub mod map;

/// Navigation control module - decides actuation demands from terrain observations
pub mod nav;

/// Executable-level parameters
pub mod params;

/// Perception module - turns camera frames into terrain observations
pub mod per;

/// Simulation client - receives telemetry frames published by the simulation server
pub mod sim_client;
