//! Colour thresholding of rectified frames into classification masks.
//!
//! Terrain classes are separated by colour alone. Navigable ground is bright sand, samples are
//! yellow-green rocks sitting in a known colour band, and everything else is obstacle. Masks are
//! binary arrays in row major `(row, col)` order with 1 marking a positive cell.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::RgbImage;
use ndarray::Array2;

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build the navigable terrain mask of a frame.
///
/// A pixel is navigable if all three channels are strictly above `min_rgb`.
pub fn navigable_mask(frame: &RgbImage, min_rgb: &[u8; 3]) -> Array2<u8> {
    mask_where(frame, |channels| {
        channels[0] > min_rgb[0] && channels[1] > min_rgb[1] && channels[2] > min_rgb[2]
    })
}

/// Build the obstacle mask as the complement of a navigable mask.
pub fn obstacle_mask(navigable: &Array2<u8>) -> Array2<u8> {
    navigable.mapv(|cell| 1 - cell)
}

/// Build the sample mask of a frame.
///
/// A pixel is a sample candidate if all three channels lie strictly inside the
/// `low_rgb..high_rgb` band, both bounds exclusive.
pub fn sample_mask(frame: &RgbImage, low_rgb: &[u8; 3], high_rgb: &[u8; 3]) -> Array2<u8> {
    mask_where(frame, |channels| {
        channels
            .iter()
            .zip(low_rgb.iter().zip(high_rgb.iter()))
            .all(|(value, (low, high))| value > low && value < high)
    })
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build a binary mask of the pixels whose channels satisfy `predicate`.
fn mask_where<F: Fn(&[u8; 3]) -> bool>(frame: &RgbImage, predicate: F) -> Array2<u8> {
    let (width, height) = frame.dimensions();
    let mut mask = Array2::zeros((height as usize, width as usize));

    for (x, y, px) in frame.enumerate_pixels() {
        if predicate(&px.0) {
            mask[[y as usize, x as usize]] = 1;
        }
    }

    mask
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use image::Rgb;

    const NAVIGABLE_MIN: [u8; 3] = [160, 160, 160];
    const SAMPLE_LOW: [u8; 3] = [0, 105, 0];
    const SAMPLE_HIGH: [u8; 3] = [255, 220, 65];

    /// A 3x2 frame with one navigable pixel, one sample pixel and assorted others.
    fn test_frame() -> RgbImage {
        let mut frame = RgbImage::new(3, 2);
        frame.put_pixel(0, 0, Rgb([200, 200, 200]));
        frame.put_pixel(1, 0, Rgb([120, 80, 40]));
        frame.put_pixel(2, 0, Rgb([160, 160, 160]));
        frame.put_pixel(0, 1, Rgb([140, 180, 20]));
        frame.put_pixel(1, 1, Rgb([0, 0, 0]));
        frame.put_pixel(2, 1, Rgb([161, 161, 161]));
        frame
    }

    #[test]
    fn test_navigable_bound_is_exclusive() {
        let mask = navigable_mask(&test_frame(), &NAVIGABLE_MIN);

        assert_eq!(mask[[0, 0]], 1);
        // A pixel exactly on the bound is not navigable
        assert_eq!(mask[[0, 2]], 0);
        assert_eq!(mask[[1, 2]], 1);
        assert_eq!(mask[[1, 1]], 0);
    }

    #[test]
    fn test_obstacle_complements_navigable() {
        let navigable = navigable_mask(&test_frame(), &NAVIGABLE_MIN);
        let obstacle = obstacle_mask(&navigable);

        assert_eq!(navigable.dim(), obstacle.dim());
        for (nav, obs) in navigable.iter().zip(obstacle.iter()) {
            assert_eq!(nav + obs, 1);
        }
    }

    #[test]
    fn test_sample_band_bounds_are_exclusive() {
        let in_band = Rgb([140, 180, 20]);
        let on_low_green = Rgb([140, 105, 20]);
        let on_high_blue = Rgb([140, 180, 65]);

        let mut frame = RgbImage::new(3, 1);
        frame.put_pixel(0, 0, in_band);
        frame.put_pixel(1, 0, on_low_green);
        frame.put_pixel(2, 0, on_high_blue);

        let mask = sample_mask(&frame, &SAMPLE_LOW, &SAMPLE_HIGH);

        assert_eq!(mask[[0, 0]], 1);
        assert_eq!(mask[[0, 1]], 0);
        assert_eq!(mask[[0, 2]], 0);
    }

    #[test]
    fn test_mask_is_row_major() {
        let mut frame = RgbImage::new(3, 2);
        frame.put_pixel(2, 1, Rgb([255, 255, 255]));

        let mask = navigable_mask(&frame, &NAVIGABLE_MIN);

        assert_eq!(mask.dim(), (2, 3));
        assert_eq!(mask[[1, 2]], 1);
        assert_eq!(mask.sum(), 1);
    }
}
