#![cfg(feature = "capture-v4l2")]

//! V4L2 camera source.
//!
//! Opens a local device node (e.g., /dev/video0), negotiates RGB24 at the
//! configured resolution hint, and captures frames through a memory-mapped
//! buffer stream. The device is released when the source is dropped, which
//! is what lets `CaptureManager` guarantee stop-then-start switching.

use anyhow::{anyhow, Context, Result};
use ouroboros::self_referencing;
use std::time::{Duration, Instant};

use super::{CameraConfig, CameraStats};
use crate::frame::Frame;

pub struct V4l2Camera {
    device_path: String,
    target_fps: u32,
    state: CameraState,
    active_width: u32,
    active_height: u32,
    frame_count: u64,
    last_frame_at: Option<Instant>,
    last_error: Option<String>,
}

#[self_referencing]
struct CameraState {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

impl V4l2Camera {
    pub fn open(config: &CameraConfig, device_path: &str) -> Result<Self> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let mut device = v4l::Device::with_path(device_path)
            .with_context(|| format!("open v4l2 device {}", device_path))?;
        let mut format = device.format().context("read v4l2 format")?;
        format.width = config.width;
        format.height = config.height;
        format.fourcc = v4l::FourCC::new(b"RGB3");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!("failed to set format on {}: {}", device_path, err);
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };
        if format.fourcc != v4l::FourCC::new(b"RGB3") {
            return Err(anyhow!(
                "device {} does not support RGB24 capture (got {})",
                device_path,
                format.fourcc
            ));
        }

        if config.target_fps > 0 {
            let params = v4l::video::capture::Parameters::with_fps(config.target_fps);
            if let Err(err) = device.set_params(&params) {
                log::warn!("failed to set fps on {}: {}", device_path, err);
            }
        }

        let state = CameraStateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()?;

        log::info!(
            "camera connected: {} ({}x{})",
            device_path,
            format.width,
            format.height
        );

        Ok(Self {
            device_path: device_path.to_string(),
            target_fps: config.target_fps,
            state,
            active_width: format.width,
            active_height: format.height,
            frame_count: 0,
            last_frame_at: None,
            last_error: None,
        })
    }

    pub fn next_frame(&mut self) -> Result<Frame> {
        use v4l::io::traits::CaptureStream;

        let mut data = self
            .state
            .with_stream_mut(|stream| stream.next().map(|(buf, _meta)| buf.to_vec()))
            .map_err(|err| {
                self.last_error = Some(err.to_string());
                anyhow::Error::new(err).context("capture v4l2 frame")
            })?;

        // Drivers may pad the buffer past the packed frame size.
        let expected = (self.active_width as usize) * (self.active_height as usize) * 3;
        if data.len() > expected {
            data.truncate(expected);
        }

        self.frame_count += 1;
        self.last_frame_at = Some(Instant::now());

        Frame::from_rgb8(data, self.active_width, self.active_height)
    }

    pub fn is_healthy(&self) -> bool {
        if self.last_error.is_some() {
            return false;
        }
        let Some(last_frame_at) = self.last_frame_at else {
            return true;
        };
        last_frame_at.elapsed() <= self.health_grace()
    }

    pub fn stats(&self) -> CameraStats {
        CameraStats {
            frames_captured: self.frame_count,
            device: self.device_path.clone(),
        }
    }

    fn health_grace(&self) -> Duration {
        let base_ms = if self.target_fps == 0 {
            2_000
        } else {
            (1000 / self.target_fps).saturating_mul(6)
        };
        Duration::from_millis(base_ms.max(2_000) as u64)
    }
}
