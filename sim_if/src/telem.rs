//! # Simulation Telemetry Module
//!
//! One `TelemFrame` is published by the simulation server per tick, carrying
//! the rover's pose and motion state along with the forward camera frame.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{serde::ts_milliseconds, DateTime, Utc};
use image::RgbImage;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Pose and motion telemetry for the rover at one simulation tick.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct RoverTelem {
    /// Position of the rover in the world frame, in metres.
    pub pos_m: [f64; 2],

    /// Heading of the rover in degrees, anticlockwise about the world +z axis.
    pub yaw_deg: f64,

    /// Pitch of the rover in signed degrees, in the range [-180, 180].
    pub pitch_deg: f64,

    /// Roll of the rover in signed degrees, in the range [-180, 180].
    pub roll_deg: f64,

    /// Forward speed of the rover in metres per second.
    pub vel_mps: f64,

    /// True when the rover is close enough to a sample for the pickup
    /// mechanism to reach it.
    pub near_sample: bool,

    /// True while the pickup mechanism is running.
    pub picking_up: bool,

    /// Number of samples collected so far in this run.
    pub samples_collected: u32,
}

/// An individual frame from the forward camera.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CamFrame {
    /// UTC timestamp at which the frame was acquired
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// The format of this frame
    pub format: ImageFormat,

    /// The formatted image data, encoded in base64.
    pub b64_data: String,
}

/// One tick of data from the simulation server.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TelemFrame {
    /// Rover pose and motion state
    pub telem: RoverTelem,

    /// Forward camera frame
    pub cam_frame: CamFrame,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Possible formats for camera images. This is used rather than
/// image::ImageFormat to:
///     1. Restrict the formats that can be sent back and forth
///     2. Allow serialisation as image::ImageFormat does not implement serde.
#[derive(Debug, Serialize, Deserialize, Copy, Clone)]
pub enum ImageFormat {
    /// PNG image
    Png,

    /// JPEG image with a quality value between 1 and 100, where 100 is best.
    Jpeg(u8),
}

/// Errors which can occur while encoding or decoding camera frames.
#[derive(Debug, thiserror::Error)]
pub enum CamError {
    #[error("Failed to decode frame data from base64: {0}")]
    Base64DecodeError(base64::DecodeError),

    #[error("Failed to decode the image data: {0}")]
    ImageDecodeError(image::ImageError),

    #[error("Failed to encode the image data: {0}")]
    ImageEncodeError(image::ImageError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CamFrame {
    /// Decode this frame into an 8 bit RGB image.
    pub fn to_rgb_image(&self) -> Result<RgbImage, CamError> {
        // Decode the bytes from the base64 string
        let bytes = base64::decode(&self.b64_data).map_err(CamError::Base64DecodeError)?;

        // Decode the formatted data
        let dyn_image = match self.format {
            ImageFormat::Png => {
                image::load_from_memory_with_format(&bytes, image::ImageFormat::Png)
            }
            ImageFormat::Jpeg(_) => {
                image::load_from_memory_with_format(&bytes, image::ImageFormat::Jpeg)
            }
        }
        .map_err(CamError::ImageDecodeError)?;

        Ok(dyn_image.to_rgb8())
    }

    /// Encode an 8 bit RGB image into a frame of the given format.
    pub fn from_rgb_image(
        image: RgbImage,
        format: ImageFormat,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, CamError> {
        // Write formatted data into the buffer
        let mut data = Vec::<u8>::new();

        let output_format = match format {
            ImageFormat::Png => image::ImageOutputFormat::Png,
            ImageFormat::Jpeg(q) => image::ImageOutputFormat::Jpeg(q),
        };

        image::DynamicImage::ImageRgb8(image)
            .write_to(&mut data, output_format)
            .map_err(CamError::ImageEncodeError)?;

        Ok(Self {
            timestamp,
            format,
            b64_data: base64::encode(&data),
        })
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cam_frame_png_round_trip() {
        // Small gradient image so that encode/decode errors show up as pixel
        // differences rather than just size changes
        let image = RgbImage::from_fn(8, 4, |x, y| image::Rgb([x as u8 * 16, y as u8 * 32, 200]));

        let frame = CamFrame::from_rgb_image(image.clone(), ImageFormat::Png, Utc::now())
            .expect("Failed to encode frame");

        let decoded = frame.to_rgb_image().expect("Failed to decode frame");

        assert_eq!(decoded.dimensions(), (8, 4));
        assert_eq!(decoded, image);
    }

    #[test]
    fn test_telem_frame_wire_shape() {
        // Mirror of the JSON produced by the simulation server
        let json = r#"{
            "telem": {
                "pos_m": [99.6, 85.6],
                "yaw_deg": 45.0,
                "pitch_deg": -0.2,
                "roll_deg": 0.1,
                "vel_mps": 1.2,
                "near_sample": false,
                "picking_up": false,
                "samples_collected": 2
            },
            "cam_frame": {
                "timestamp": 1600000000000,
                "format": "Png",
                "b64_data": ""
            }
        }"#;

        let frame: TelemFrame = serde_json::from_str(json).expect("Failed to deserialize");

        assert_eq!(frame.telem.pos_m, [99.6, 85.6]);
        assert_eq!(frame.telem.samples_collected, 2);
        assert!(!frame.telem.near_sample);
    }
}
