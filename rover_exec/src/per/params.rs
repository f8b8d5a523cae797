//! Perception parameters
//!
//! This module provides the parameters used by the perception module, which are loaded from the
//! `per_mgr.toml` parameter file. Threshold and geometry defaults were calibrated against the
//! simulation's front camera.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the perception module.
#[derive(Debug, Clone, Deserialize)]
pub struct PerParams {
    /// Width of a valid camera frame.
    ///
    /// Units: pixels
    pub frame_width_px: u32,

    /// Height of a valid camera frame.
    ///
    /// Units: pixels
    pub frame_height_px: u32,

    /// Source quadrilateral of the rectification transform, as `[x, y]` pixel positions of a
    /// known ground square in the raw camera frame. Order: bottom left, bottom right, top right,
    /// top left.
    ///
    /// Units: pixels
    pub src_quad_px: [[f64; 2]; 4],

    /// Half the side length of the rectified destination square.
    ///
    /// Units: pixels
    pub dst_size_px: f64,

    /// Offset between the bottom edge of the rectified frame and the rover's ground contact
    /// point, accounting for the terrain hidden by the rover body.
    ///
    /// Units: pixels
    pub bottom_offset_px: f64,

    /// Lower bound on all three channels for a pixel to classify as navigable terrain. The
    /// bound is exclusive.
    ///
    /// Units: RGB intensity
    pub navigable_min_rgb: [u8; 3],

    /// Lower bound of the sample colour band, exclusive in all three channels.
    ///
    /// Units: RGB intensity
    pub sample_low_rgb: [u8; 3],

    /// Upper bound of the sample colour band, exclusive in all three channels.
    ///
    /// Units: RGB intensity
    pub sample_high_rgb: [u8; 3],

    /// Number of rectified pixels per world map cell.
    ///
    /// Units: pixels/cell
    pub world_scale: f64,

    /// Number of cells along each axis of the world map.
    ///
    /// Units: cells
    pub world_size: usize,

    /// Maximum absolute pitch or roll at which perception output is trusted enough to be
    /// accumulated into the world map.
    ///
    /// Units: degrees
    pub max_tilt_deg: f64,
}
