//! Coordinate transforms between mask, rover and world frames.
//!
//! Positive mask cells are first expressed in the rover frame, where the origin is the rover's
//! ground contact point at the bottom centre of the rectified frame and +x points forward. From
//! there they go two ways: into polar observation sets for navigation control, and into world
//! map cells by rotation through the rover's yaw, scaling and translation.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Rotation2, Vector2};
use ndarray::Array2;
use util::maths;

use super::obs::ObsSet;

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Express the positive cells of a mask in the rover frame.
///
/// Returns parallel `(x, y)` sequences in rectified pixel units, with +x forward of the rover
/// and +y to its left.
pub fn rover_coords(mask: &Array2<u8>) -> (Vec<f64>, Vec<f64>) {
    let (rows, cols) = mask.dim();
    let half_width = cols as f64 / 2.0;

    let mut x_px = Vec::new();
    let mut y_px = Vec::new();

    for ((row, col), cell) in mask.indexed_iter() {
        if *cell > 0 {
            x_px.push(rows as f64 - row as f64);
            y_px.push(half_width - col as f64);
        }
    }

    (x_px, y_px)
}

/// Convert rover frame positions into a polar observation set.
pub fn to_polar(x_px: &[f64], y_px: &[f64]) -> ObsSet {
    let dists_px = x_px
        .iter()
        .zip(y_px.iter())
        .map(|(x, y)| x.hypot(*y))
        .collect();
    let angles_rad = x_px
        .iter()
        .zip(y_px.iter())
        .map(|(x, y)| y.atan2(*x))
        .collect();

    ObsSet {
        dists_px,
        angles_rad,
    }
}

/// Project rover frame positions into world map cells.
///
/// Positions are rotated through the rover's yaw, scaled from rectified pixels into cells and
/// translated by the rover's position. Cells are truncated to integer positions and clamped to
/// the map bounds, so positions beyond the map edge pin to the nearest edge cell. Returned cells
/// are `(x, y)` pairs.
pub fn to_world(
    x_px: &[f64],
    y_px: &[f64],
    pos_m: [f64; 2],
    yaw_deg: f64,
    scale: f64,
    world_size: usize,
) -> Vec<(usize, usize)> {
    let rotation = Rotation2::new(maths::deg_to_rad(yaw_deg));
    let max_cell = (world_size as i64 - 1).max(0);

    x_px.iter()
        .zip(y_px.iter())
        .map(|(x, y)| {
            let rotated = rotation * Vector2::new(*x, *y);
            let world_x = rotated[0] / scale + pos_m[0];
            let world_y = rotated[1] / scale + pos_m[1];

            (
                (world_x as i64).clamp(0, max_cell) as usize,
                (world_y as i64).clamp(0, max_cell) as usize,
            )
        })
        .collect()
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_rover_coords_origin_is_bottom_centre() {
        // 4 wide, 3 tall mask with one positive cell at the bottom centre
        let mut mask = Array2::<u8>::zeros((3, 4));
        mask[[2, 2]] = 1;

        let (x_px, y_px) = rover_coords(&mask);

        assert_eq!(x_px, vec![1.0]);
        assert_eq!(y_px, vec![0.0]);
    }

    #[test]
    fn test_rover_coords_left_is_positive_y() {
        let mask = arr2(&[[1u8, 0, 0, 0]]);

        let (x_px, y_px) = rover_coords(&mask);

        assert_eq!(x_px, vec![1.0]);
        assert_eq!(y_px, vec![2.0]);
    }

    #[test]
    fn test_to_polar() {
        let obs = to_polar(&[3.0, 1.0], &[4.0, 0.0]);

        assert_eq!(obs.len(), 2);
        assert!((obs.dists_px[0] - 5.0).abs() < 1e-9);
        assert!((obs.angles_rad[0] - 4.0f64.atan2(3.0)).abs() < 1e-9);
        assert_eq!(obs.dists_px[1], 1.0);
        assert_eq!(obs.angles_rad[1], 0.0);
    }

    #[test]
    fn test_to_world_scales_and_translates() {
        let cells = to_world(&[25.0, -7.0], &[-7.0, 25.0], [99.5, 100.2], 0.0, 10.0, 200);

        assert_eq!(cells[0], (102, 99));
        assert_eq!(cells[1], (98, 102));
    }

    #[test]
    fn test_to_world_rotates_through_yaw() {
        // 90 deg yaw turns forward into +y
        let cells = to_world(&[50.0], &[0.0], [100.0, 100.0], 90.0, 10.0, 200);

        assert_eq!(cells[0], (100, 105));
    }

    #[test]
    fn test_to_world_pins_cells_to_map_bounds() {
        let cells = to_world(
            &[500.0, -500.0],
            &[500.0, -500.0],
            [100.0, 100.0],
            0.0,
            1.0,
            200,
        );

        assert_eq!(cells[0], (199, 199));
        assert_eq!(cells[1], (0, 0));
    }

    #[test]
    fn test_to_world_truncates_towards_zero() {
        let cells = to_world(&[39.0], &[-9.0], [0.0, 1.0], 0.0, 10.0, 200);

        assert_eq!(cells[0], (3, 0));
    }
}
