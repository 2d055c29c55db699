//! Narration session: the detection loop and the static-image analyzer.
//!
//! One `NarratorSession` owns the capture manager, the detector handle, the
//! renderer, the speech notifier, and the re-entrancy gate. Live mode and
//! static mode share the detection, rendering, and speech code; they differ
//! only in where the pixels come from and in which threshold filters the
//! output.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use image::RgbImage;

use crate::capture::{CaptureManager, Facing};
use crate::config::{NarratorConfig, Thresholds};
use crate::detect::{labels_above, Detection, DetectorBackend};
use crate::frame::Frame;
use crate::gate::DetectGate;
use crate::render::Renderer;
use crate::speech::{SpeakOutcome, SpeechEngine, SpeechNotifier};

/// What one pass of the live loop did.
///
/// No variant is fatal: the loop logs, skips the cycle, and self-heals on
/// the next tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Full detect/render/speak pass completed.
    Ran {
        detections: usize,
        drawn: usize,
        speech: SpeakOutcome,
    },
    /// A detection pass is already in flight; this tick was skipped.
    Busy,
    /// No active camera stream.
    Inactive,
    /// Frame capture failed this cycle.
    FrameFailed,
    /// Detector returned an error this cycle.
    DetectorFailed,
}

/// Result of one static-image analysis.
#[derive(Clone, Debug)]
pub struct StaticReport {
    /// User-visible status line.
    pub status: String,
    /// Deduplicated labels at or above the speak threshold.
    pub labels: Vec<String>,
    /// Speech outcome for the "I see ..." utterance.
    pub speech: SpeakOutcome,
    /// Annotated copy of the analyzed image.
    pub annotated: RgbImage,
}

pub struct NarratorSession {
    capture: CaptureManager,
    detector: Arc<Mutex<dyn DetectorBackend>>,
    renderer: Renderer,
    notifier: SpeechNotifier,
    gate: DetectGate,
    thresholds: Thresholds,
    status: String,
    last_annotated: Option<RgbImage>,
}

impl NarratorSession {
    pub fn new(
        config: &NarratorConfig,
        detector: Arc<Mutex<dyn DetectorBackend>>,
        engine: Box<dyn SpeechEngine>,
    ) -> Self {
        let mut renderer = Renderer::new();
        if let Some(path) = &config.font_path {
            match Renderer::new().with_font_path(path) {
                Ok(with_font) => renderer = with_font,
                Err(err) => log::warn!("label captions disabled: {}", err),
            }
        }
        let notifier = SpeechNotifier::new(engine).with_interval(config.speech.interval);

        Self {
            capture: CaptureManager::new(config.camera.clone()),
            detector,
            renderer,
            notifier,
            gate: DetectGate::new(),
            thresholds: config.thresholds,
            status: String::new(),
            last_annotated: None,
        }
    }

    /// Run the detector's warm-up hook once before the loop starts.
    pub fn warm_up(&mut self) -> Result<()> {
        self.lock_detector()?.warm_up().context("detector warm-up failed")
    }

    /// Acquire the camera. On failure the error is surfaced on the status
    /// line and no stream is left active; the user retries by toggling.
    pub fn start_live(&mut self, facing: Facing) -> Result<()> {
        if let Err(err) = self.capture.start(facing) {
            self.status = format!("Error accessing the camera: {}", err);
            return Err(err);
        }
        Ok(())
    }

    /// Switch between front and back camera (stop-then-start).
    pub fn toggle_camera(&mut self) -> Result<Facing> {
        match self.capture.toggle() {
            Ok(facing) => Ok(facing),
            Err(err) => {
                self.status = format!("Error accessing the camera: {}", err);
                Err(err)
            }
        }
    }

    /// One pass of the live loop: pull a frame, detect, render, speak.
    ///
    /// The gate permit is held across detect, render, and notify, and is
    /// released on every exit path.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.capture.is_active() {
            return TickOutcome::Inactive;
        }
        let Some(_permit) = self.gate.try_acquire() else {
            return TickOutcome::Busy;
        };

        let Some(source) = self.capture.active_mut() else {
            return TickOutcome::Inactive;
        };
        let frame = match source.next_frame() {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("frame capture failed: {}", err);
                return TickOutcome::FrameFailed;
            }
        };

        let detections = match self.run_detector(&frame) {
            Ok(detections) => detections,
            Err(err) => {
                log::warn!("detection failed: {}", err);
                return TickOutcome::DetectorFailed;
            }
        };

        let out = self.renderer.render(&frame, &detections, self.thresholds.draw);
        self.status = out.status;
        self.last_annotated = Some(out.image);
        let speech = self.notifier.notify(&detections, self.thresholds.speak);

        TickOutcome::Ran {
            detections: detections.len(),
            drawn: out.drawn,
            speech,
        }
    }

    /// One-shot analysis of a still image.
    ///
    /// Releases any live camera stream first, filters both status and speech
    /// by the speak threshold, and speaks "I see ..." unconditionally
    /// (cancelling prior speech) when anything clears it.
    pub fn analyze_image(&mut self, frame: &Frame) -> Result<StaticReport> {
        self.capture.stop();
        self.status = "Analyzing image...".to_string();

        let detections = self.run_detector(frame)?;
        let labels: Vec<String> = labels_above(&detections, self.thresholds.speak)
            .into_iter()
            .map(str::to_string)
            .collect();
        let annotated = self
            .renderer
            .render(frame, &detections, self.thresholds.speak)
            .image;

        let (status, speech) = if labels.is_empty() {
            (
                "No objects detected with high confidence.".to_string(),
                SpeakOutcome::NothingToSay,
            )
        } else {
            let sentence = format!("I see {}", labels.join(" and "));
            (
                format!("Detected: {}", labels.join(", ")),
                self.notifier.announce(&sentence),
            )
        };

        self.status = status.clone();
        self.last_annotated = Some(annotated.clone());
        Ok(StaticReport {
            status,
            labels,
            speech,
            annotated,
        })
    }

    /// Load and analyze an image file (JPEG/PNG).
    pub fn analyze_image_file<P: AsRef<Path>>(&mut self, path: P) -> Result<StaticReport> {
        let path = path.as_ref();
        let image = image::open(path)
            .with_context(|| format!("failed to load image {}", path.display()))?;
        self.analyze_image(&Frame::from_image(image))
    }

    /// Save the last annotated frame as PNG.
    pub fn snapshot<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let image = self
            .last_annotated
            .as_ref()
            .ok_or_else(|| anyhow!("no annotated frame available yet"))?;
        image
            .save(path)
            .with_context(|| format!("failed to write snapshot {}", path.display()))?;
        log::info!("snapshot written to {}", path.display());
        Ok(())
    }

    /// Release the camera and cancel any in-flight speech.
    pub fn stop(&mut self) {
        self.capture.stop();
        self.notifier.cancel();
    }

    /// Latest user-visible status line.
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn facing(&self) -> Facing {
        self.capture.facing()
    }

    pub fn is_live(&self) -> bool {
        self.capture.is_active()
    }

    /// True while a detection pass is in flight.
    pub fn is_detecting(&self) -> bool {
        self.gate.is_busy()
    }

    pub fn capture(&self) -> &CaptureManager {
        &self.capture
    }

    fn run_detector(&self, frame: &Frame) -> Result<Vec<Detection>> {
        self.lock_detector()?
            .detect(frame.pixels(), frame.width(), frame.height())
    }

    fn lock_detector(&self) -> Result<std::sync::MutexGuard<'_, dyn DetectorBackend + 'static>> {
        self.detector
            .lock()
            .map_err(|_| anyhow!("detector lock poisoned"))
    }
}

impl Drop for NarratorSession {
    fn drop(&mut self) {
        self.stop();
    }
}
