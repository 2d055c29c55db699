//! Frame container shared by the capture, detection, and render layers.
//!
//! A `Frame` is a packed RGB8 buffer plus its dimensions. Capture sources
//! produce frames, detector backends read them, and the renderer draws them
//! as the background of the annotated output.

use anyhow::{anyhow, Result};
use image::{DynamicImage, RgbImage};

/// One captured frame or decoded still image, packed RGB8.
#[derive(Clone, Debug)]
pub struct Frame {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl Frame {
    /// Wrap a packed RGB8 buffer. The buffer length must be `width * height * 3`.
    pub fn from_rgb8(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected,
                width,
                height,
                pixels.len()
            ));
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    /// Decode a loaded image into a frame.
    pub fn from_image(image: DynamicImage) -> Self {
        let rgb = image.into_rgb8();
        let (width, height) = rgb.dimensions();
        Self {
            pixels: rgb.into_raw(),
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGB8 bytes, row-major, no padding.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Copy into an owned `RgbImage` for drawing.
    pub fn to_image(&self) -> RgbImage {
        RgbImage::from_raw(self.width, self.height, self.pixels.clone())
            .unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_buffer_length() {
        assert!(Frame::from_rgb8(vec![0u8; 10], 4, 4).is_err());
        assert!(Frame::from_rgb8(vec![0u8; 48], 4, 4).is_ok());
    }

    #[test]
    fn round_trips_through_rgb_image() {
        let frame = Frame::from_rgb8(vec![7u8; 2 * 3 * 3], 2, 3).unwrap();
        let img = frame.to_image();
        assert_eq!(img.dimensions(), (2, 3));
        assert_eq!(img.get_pixel(1, 2).0, [7, 7, 7]);
    }
}
