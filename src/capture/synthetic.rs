use anyhow::Result;

use super::{CameraConfig, CameraStats};
use crate::frame::Frame;

/// Synthetic camera for `stub://` devices.
///
/// Renders a dark scene with one bright square that drifts across the frame
/// and periodically changes size, so the built-in luma backend has something
/// real to find. Deterministic: the scene depends only on the frame counter.
pub struct SyntheticCamera {
    config: CameraConfig,
    device: String,
    frame_count: u64,
}

impl SyntheticCamera {
    pub fn new(config: CameraConfig, device: String) -> Self {
        log::info!("camera connected: {} (synthetic)", device);
        Self {
            config,
            device,
            frame_count: 0,
        }
    }

    pub fn next_frame(&mut self) -> Result<Frame> {
        let width = self.config.width;
        let height = self.config.height;
        let mut pixels = vec![12u8; (width * height * 3) as usize];

        // Big square for ~50 frames, then small, alternating.
        let size = if (self.frame_count / 50) % 2 == 0 {
            height / 2
        } else {
            height / 8
        }
        .max(16)
        .min(width - 1)
        .min(height - 1);
        let x = ((self.frame_count * 7) % (width - size) as u64) as u32;
        let y = ((self.frame_count * 3) % (height - size) as u64) as u32;

        for dy in 0..size {
            let row = ((y + dy) * width + x) as usize * 3;
            for dx in 0..size as usize {
                pixels[row + dx * 3] = 235;
                pixels[row + dx * 3 + 1] = 235;
                pixels[row + dx * 3 + 2] = 235;
            }
        }

        self.frame_count += 1;
        Frame::from_rgb8(pixels, width, height)
    }

    pub fn is_healthy(&self) -> bool {
        true
    }

    pub fn stats(&self) -> CameraStats {
        CameraStats {
            frames_captured: self.frame_count,
            device: self.device.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_moves_between_frames() {
        let config = CameraConfig {
            width: 320,
            height: 240,
            ..CameraConfig::default()
        };
        let mut camera = SyntheticCamera::new(config, "stub://test".to_string());
        let a = camera.next_frame().unwrap();
        let b = camera.next_frame().unwrap();
        assert_ne!(a.pixels(), b.pixels());
    }
}
