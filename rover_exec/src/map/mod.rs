//! # World map module
//!
//! Provides the persistent terrain knowledge map built up from perception output over the course
//! of a run.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod world_map;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use world_map::{WorldMap, WorldMapLayer, DEFAULT_WORLD_SIZE, NUM_LAYERS};
