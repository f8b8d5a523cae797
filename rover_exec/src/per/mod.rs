//! # Perception module
//!
//! Turns raw camera frames into the terrain knowledge the rest of the rover runs on. Each pass
//! over a frame:
//!
//! 1. Rectifies the frame into a top-down view ([`rectify`])
//! 2. Thresholds the rectified frame into navigable, obstacle and sample masks ([`thresh`])
//! 3. Expresses the masks in the rover frame and in polar form ([`transforms`], [`obs`])
//! 4. Votes the classified cells into the world map, provided the rover sits flat enough for
//!    the flat-ground projection to hold
//!
//! The pass also produces a classification overlay for operator display, with obstacle in red,
//! sample in green and navigable in blue.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod obs;
mod params;
pub mod rectify;
pub mod thresh;
pub mod transforms;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use obs::{ObsSet, PerObs};
pub use params::PerParams;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::{Rgb, RgbImage};
use ndarray::Array2;
use sim_if::telem::RoverTelem;

use crate::map::{WorldMap, WorldMapLayer};
use rectify::{PerspectiveTransform, RectifyError};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Perception manager.
///
/// Holds the parameters and the fitted rectification transform, and runs the perception pass
/// over each incoming frame.
pub struct PerMgr {
    pub params: PerParams,
    rectifier: PerspectiveTransform,
}

/// Full output of one perception pass.
#[derive(Debug, Clone)]
pub struct PerOutput {
    /// Polar observation sets for navigation control.
    pub obs: PerObs,

    /// Classification overlay of the rectified frame for operator display.
    pub overlay: RgbImage,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur in the perception module.
#[derive(Debug, thiserror::Error)]
pub enum PerError {
    #[error(
        "Frame geometry mismatch, expected a {expected_width}x{expected_height} pixel frame \
        but got {actual_width}x{actual_height}"
    )]
    FrameGeomMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("Could not fit the rectification transform: {0}")]
    RectifyFailed(#[from] RectifyError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PerMgr {
    /// Create a new perception manager, fitting the rectification transform from the calibrated
    /// ground square in the parameters.
    pub fn new(params: PerParams) -> Result<Self, PerError> {
        let dst_quad = rectified_dst_quad(&params);
        let rectifier = PerspectiveTransform::between_quads(&params.src_quad_px, &dst_quad)?;

        Ok(Self { params, rectifier })
    }

    /// Run one perception pass over a camera frame.
    ///
    /// Frames whose geometry does not match the calibrated frame size are rejected, since the
    /// rectification transform is only valid for the geometry it was fitted to. The world map is
    /// only updated when both pitch and roll are within the stability gate, but observation sets
    /// are produced regardless of attitude.
    pub fn process(
        &self,
        frame: &RgbImage,
        telem: &RoverTelem,
        world_map: &mut WorldMap,
    ) -> Result<PerOutput, PerError> {
        let (width, height) = frame.dimensions();

        if width != self.params.frame_width_px || height != self.params.frame_height_px {
            return Err(PerError::FrameGeomMismatch {
                expected_width: self.params.frame_width_px,
                expected_height: self.params.frame_height_px,
                actual_width: width,
                actual_height: height,
            });
        }

        let rectified = self.rectifier.warp_rgb(frame);

        let navigable = thresh::navigable_mask(&rectified, &self.params.navigable_min_rgb);
        let obstacle = thresh::obstacle_mask(&navigable);
        let sample = thresh::sample_mask(
            &rectified,
            &self.params.sample_low_rgb,
            &self.params.sample_high_rgb,
        );

        let overlay = build_overlay(&obstacle, &sample, &navigable);

        let (nav_x, nav_y) = transforms::rover_coords(&navigable);
        let (sample_x, sample_y) = transforms::rover_coords(&sample);
        let sample_px_count = sample_x.len();

        // Attitude gate: the projection into the world assumes flat ground under the rover
        if telem.pitch_deg.abs() < self.params.max_tilt_deg
            && telem.roll_deg.abs() < self.params.max_tilt_deg
        {
            let (obs_x, obs_y) = transforms::rover_coords(&obstacle);

            let project = |x_px: &[f64], y_px: &[f64]| {
                transforms::to_world(
                    x_px,
                    y_px,
                    telem.pos_m,
                    telem.yaw_deg,
                    self.params.world_scale,
                    self.params.world_size,
                )
            };

            world_map.accumulate(WorldMapLayer::Obstacle, &project(&obs_x, &obs_y));
            world_map.accumulate(WorldMapLayer::Sample, &project(&sample_x, &sample_y));
            world_map.accumulate(WorldMapLayer::Navigable, &project(&nav_x, &nav_y));
        }

        Ok(PerOutput {
            obs: PerObs {
                navigable: transforms::to_polar(&nav_x, &nav_y),
                sample: transforms::to_polar(&sample_x, &sample_y),
                sample_px_count,
            },
            overlay,
        })
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Destination quadrilateral of the rectification transform.
///
/// A square of side `2 * dst_size_px` sitting centred just above the bottom edge of the frame,
/// corner order matching the calibrated source quadrilateral.
fn rectified_dst_quad(params: &PerParams) -> [[f64; 2]; 4] {
    let width = params.frame_width_px as f64;
    let height = params.frame_height_px as f64;
    let half_width = width / 2.0;
    let size = params.dst_size_px;
    let bottom = params.bottom_offset_px;

    [
        [half_width - size, height - bottom],
        [half_width + size, height - bottom],
        [half_width + size, height - 2.0 * size - bottom],
        [half_width - size, height - 2.0 * size - bottom],
    ]
}

/// Build the classification overlay from the three masks.
fn build_overlay(
    obstacle: &Array2<u8>,
    sample: &Array2<u8>,
    navigable: &Array2<u8>,
) -> RgbImage {
    let (rows, cols) = navigable.dim();

    RgbImage::from_fn(cols as u32, rows as u32, |x, y| {
        let cell = [y as usize, x as usize];

        Rgb([
            obstacle[cell] * 255,
            sample[cell] * 255,
            navigable[cell] * 255,
        ])
    })
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
