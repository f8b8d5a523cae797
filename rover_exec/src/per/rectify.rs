//! Perspective rectification of raw camera frames.
//!
//! The raw front camera frame is a perspective view of the ground. Rectification maps it into a
//! top-down view in which ground distances are uniform, so that classified pixels can be
//! projected into the rover frame by simple arithmetic. The transform is a 3x3 homography fitted
//! to a known ground square by direct linear transform, and frames are warped by inverse mapping
//! with bilinear sampling. Rectified pixels with no source in the raw frame are black, and so
//! classify as obstacle downstream.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::{Rgb, RgbImage};
use nalgebra::{DMatrix, DVector, Matrix3, Vector3};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Homogeneous scale factors below this magnitude are treated as a projection to infinity.
const MIN_HOMOGENEOUS_W: f64 = 1e-10;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A plane-to-plane perspective transform between the raw camera frame and the rectified
/// top-down view.
#[derive(Debug, Clone)]
pub struct PerspectiveTransform {
    /// Maps raw frame positions into the rectified view.
    h: Matrix3<f64>,

    /// Maps rectified positions back into the raw frame.
    h_inv: Matrix3<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur when fitting a perspective transform.
#[derive(Debug, thiserror::Error)]
pub enum RectifyError {
    #[error(
        "Cannot fit a perspective transform to the given quadrilaterals, the corner \
        correspondences are degenerate"
    )]
    DegenerateQuad,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PerspectiveTransform {
    /// Fit the transform mapping the corners of `src_quad` onto the corners of `dst_quad`.
    ///
    /// Corners must be given in matching order in both quadrilaterals. Fails if the
    /// correspondences are degenerate, for example if three corners are collinear.
    pub fn between_quads(
        src_quad: &[[f64; 2]; 4],
        dst_quad: &[[f64; 2]; 4],
    ) -> Result<Self, RectifyError> {
        let h = fit_homography(src_quad, dst_quad)?;
        let h_inv = h.try_inverse().ok_or(RectifyError::DegenerateQuad)?;

        Ok(Self { h, h_inv })
    }

    /// Map a position in the raw frame into the rectified view.
    pub fn apply(&self, point_px: [f64; 2]) -> [f64; 2] {
        apply_homography(&self.h, point_px)
    }

    /// Map a position in the rectified view back into the raw frame.
    pub fn apply_inverse(&self, point_px: [f64; 2]) -> [f64; 2] {
        apply_homography(&self.h_inv, point_px)
    }

    /// Warp a raw frame into the rectified view.
    ///
    /// The output has the same dimensions as the input. Output pixels are found by inverse
    /// mapping with bilinear sampling, and pixels which map outside the raw frame are black.
    pub fn warp_rgb(&self, frame: &RgbImage) -> RgbImage {
        let (width, height) = frame.dimensions();

        RgbImage::from_fn(width, height, |x, y| {
            let src_px = self.apply_inverse([x as f64, y as f64]);

            bilinear_sample(frame, src_px).unwrap_or(Rgb([0, 0, 0]))
        })
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Fit a homography to four point correspondences by direct linear transform.
///
/// With the lower right element fixed at one the eight remaining elements are the solution of an
/// 8x8 linear system, two rows per correspondence.
fn fit_homography(
    src_quad: &[[f64; 2]; 4],
    dst_quad: &[[f64; 2]; 4],
) -> Result<Matrix3<f64>, RectifyError> {
    let mut a = DMatrix::<f64>::zeros(8, 8);
    let mut b = DVector::<f64>::zeros(8);

    for (i, (src, dst)) in src_quad.iter().zip(dst_quad.iter()).enumerate() {
        let [x, y] = *src;
        let [u, v] = *dst;

        a[(2 * i, 0)] = x;
        a[(2 * i, 1)] = y;
        a[(2 * i, 2)] = 1.0;
        a[(2 * i, 6)] = -u * x;
        a[(2 * i, 7)] = -u * y;
        b[2 * i] = u;

        a[(2 * i + 1, 3)] = x;
        a[(2 * i + 1, 4)] = y;
        a[(2 * i + 1, 5)] = 1.0;
        a[(2 * i + 1, 6)] = -v * x;
        a[(2 * i + 1, 7)] = -v * y;
        b[2 * i + 1] = v;
    }

    let h = a.lu().solve(&b).ok_or(RectifyError::DegenerateQuad)?;

    Ok(Matrix3::new(
        h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0,
    ))
}

/// Apply a homography to a position.
///
/// Positions projecting to infinity are returned unchanged.
fn apply_homography(h: &Matrix3<f64>, point_px: [f64; 2]) -> [f64; 2] {
    let mapped = h * Vector3::new(point_px[0], point_px[1], 1.0);

    if mapped[2].abs() < MIN_HOMOGENEOUS_W {
        return point_px;
    }

    [mapped[0] / mapped[2], mapped[1] / mapped[2]]
}

/// Sample a frame at a fractional position by bilinear interpolation.
///
/// Returns `None` if the position lies more than half a pixel outside the frame. Positions
/// within that margin sample the nearest edge pixel.
fn bilinear_sample(frame: &RgbImage, point_px: [f64; 2]) -> Option<Rgb<u8>> {
    let (width, height) = frame.dimensions();
    let max_x = (width - 1) as f64;
    let max_y = (height - 1) as f64;
    let [x, y] = point_px;

    if x < -0.5 || y < -0.5 || x > max_x + 0.5 || y > max_y + 0.5 {
        return None;
    }

    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);

    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = frame.get_pixel(x0, y0);
    let p10 = frame.get_pixel(x1, y0);
    let p01 = frame.get_pixel(x0, y1);
    let p11 = frame.get_pixel(x1, y1);

    let mut sampled = [0u8; 3];

    for (c, value) in sampled.iter_mut().enumerate() {
        let interp = p00[c] as f64 * (1.0 - fx) * (1.0 - fy)
            + p10[c] as f64 * fx * (1.0 - fy)
            + p01[c] as f64 * (1.0 - fx) * fy
            + p11[c] as f64 * fx * fy;

        *value = interp.round() as u8;
    }

    Some(Rgb(sampled))
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
