//! Camera capture layer.
//!
//! Sources:
//! - Synthetic camera (`stub://` devices) for tests, demos, and default builds
//! - Local V4L2 devices (feature: capture-v4l2)
//!
//! The capture layer owns the exclusive-stream invariant: at most one camera
//! source is active at a time. `CaptureManager::start` always releases the
//! previous source before acquiring a new one, and a failed acquisition
//! leaves no source active.

mod synthetic;
#[cfg(feature = "capture-v4l2")]
mod v4l2;

use anyhow::{anyhow, Result};
use serde::Deserialize;

use crate::frame::Frame;
use synthetic::SyntheticCamera;
#[cfg(feature = "capture-v4l2")]
use v4l2::V4l2Camera;

/// Which camera to face. Phones expose both; laptops usually only front.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Front,
    #[default]
    Back,
}

impl Facing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Facing::Front => "front",
            Facing::Back => "back",
        }
    }

    pub fn toggled(&self) -> Facing {
        match self {
            Facing::Front => Facing::Back,
            Facing::Back => Facing::Front,
        }
    }
}

/// Camera configuration. Width/height are resolution hints; the device may
/// negotiate a different active resolution.
#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Device for `Facing::Front` (e.g., "/dev/video1" or "stub://front").
    pub front_device: String,
    /// Device for `Facing::Back`.
    pub back_device: String,
    /// Target frame rate (frames per second).
    pub target_fps: u32,
    /// Preferred frame width.
    pub width: u32,
    /// Preferred frame height.
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            front_device: "stub://front".to_string(),
            back_device: "stub://back".to_string(),
            target_fps: 30,
            width: 1280,
            height: 720,
        }
    }
}

impl CameraConfig {
    pub fn device_for(&self, facing: Facing) -> &str {
        match facing {
            Facing::Front => &self.front_device,
            Facing::Back => &self.back_device,
        }
    }
}

/// One open camera stream. Dropping the source releases the device.
pub struct CameraSource {
    backend: CameraBackend,
    device: String,
}

enum CameraBackend {
    Synthetic(SyntheticCamera),
    #[cfg(feature = "capture-v4l2")]
    Device(V4l2Camera),
}

impl CameraSource {
    /// Open the device configured for `facing`.
    pub fn open(config: &CameraConfig, facing: Facing) -> Result<Self> {
        let device = config.device_for(facing).to_string();
        if device.trim().is_empty() {
            return Err(anyhow!("no camera device configured for {}", facing.as_str()));
        }
        let backend = if device.starts_with("stub://") {
            CameraBackend::Synthetic(SyntheticCamera::new(config.clone(), device.clone()))
        } else {
            #[cfg(feature = "capture-v4l2")]
            {
                use anyhow::Context;
                CameraBackend::Device(
                    V4l2Camera::open(config, &device)
                        .with_context(|| format!("open camera device {}", device))?,
                )
            }
            #[cfg(not(feature = "capture-v4l2"))]
            {
                return Err(anyhow!(
                    "camera device {} requires the capture-v4l2 feature",
                    device
                ));
            }
        };
        log::info!("camera started: {} ({})", device, facing.as_str());
        Ok(Self { backend, device })
    }

    /// Capture the next frame.
    pub fn next_frame(&mut self) -> Result<Frame> {
        match &mut self.backend {
            CameraBackend::Synthetic(camera) => camera.next_frame(),
            #[cfg(feature = "capture-v4l2")]
            CameraBackend::Device(camera) => camera.next_frame(),
        }
    }

    /// Check if the source is healthy.
    pub fn is_healthy(&self) -> bool {
        match &self.backend {
            CameraBackend::Synthetic(camera) => camera.is_healthy(),
            #[cfg(feature = "capture-v4l2")]
            CameraBackend::Device(camera) => camera.is_healthy(),
        }
    }

    /// Frame statistics.
    pub fn stats(&self) -> CameraStats {
        match &self.backend {
            CameraBackend::Synthetic(camera) => camera.stats(),
            #[cfg(feature = "capture-v4l2")]
            CameraBackend::Device(camera) => camera.stats(),
        }
    }

    pub fn device(&self) -> &str {
        &self.device
    }
}

/// Statistics for a camera source.
#[derive(Clone, Debug)]
pub struct CameraStats {
    pub frames_captured: u64,
    pub device: String,
}

/// Owns the at-most-one-active-stream invariant.
pub struct CaptureManager {
    config: CameraConfig,
    facing: Facing,
    active: Option<CameraSource>,
}

impl CaptureManager {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            facing: Facing::default(),
            active: None,
        }
    }

    /// Acquire the camera for `facing`, releasing any previously active
    /// source first. On failure no source is left active.
    pub fn start(&mut self, facing: Facing) -> Result<()> {
        self.stop();
        self.facing = facing;
        let source = CameraSource::open(&self.config, facing)?;
        self.active = Some(source);
        Ok(())
    }

    /// Release the active source. No-op when none is active.
    pub fn stop(&mut self) {
        if let Some(source) = self.active.take() {
            log::info!("camera stopped: {}", source.device());
        }
    }

    /// Switch between front and back camera (stop-then-start).
    pub fn toggle(&mut self) -> Result<Facing> {
        let next = self.facing.toggled();
        self.start(next)?;
        Ok(next)
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_mut(&mut self) -> Option<&mut CameraSource> {
        self.active.as_mut()
    }

    pub fn active(&self) -> Option<&CameraSource> {
        self.active.as_ref()
    }
}
