//! Scene Narrator
//!
//! Spoken object detection for camera feeds and still images: frames flow
//! from a camera (or a decoded image file) through a pluggable detector
//! backend, get drawn with bounding boxes and labels, and are summarized
//! aloud through a throttled speech notifier.
//!
//! # Architecture
//!
//! Data flows one way; no component depends on the ones after it:
//!
//! 1. `capture`: camera sources and the exclusive-stream manager
//! 2. `session`: the detection loop (single-permit gate, per-tick state
//!    machine) and the one-shot static-image analyzer
//! 3. `render`: annotated output frame + user-visible status line
//! 4. `speech`: spoken sentences, throttled by content, time, and engine
//!    idleness
//!
//! Detector backends live in `detect`; default builds carry a synthetic
//! camera and a built-in brightness detector so the whole pipeline runs
//! without hardware or a model file. Real ONNX inference, V4L2 capture, and
//! platform speech are feature-gated (`backend-tract`, `capture-v4l2`,
//! `speech-tts`).

pub mod capture;
pub mod config;
pub mod detect;
pub mod frame;
pub mod gate;
pub mod render;
pub mod session;
pub mod speech;
pub mod ui;

pub use capture::{CameraConfig, CameraSource, CaptureManager, Facing};
pub use config::{NarratorConfig, Thresholds};
pub use detect::{
    labels_above, load_with_retry, BackendRegistry, BoundingBox, Detection, DetectorBackend,
    LumaBackend, ScriptedBackend,
};
#[cfg(feature = "backend-tract")]
pub use detect::TractBackend;
pub use frame::Frame;
pub use gate::{DetectGate, DetectPermit};
pub use render::{RenderOutput, Renderer};
pub use session::{NarratorSession, StaticReport, TickOutcome};
#[cfg(feature = "speech-tts")]
pub use speech::SystemSpeech;
pub use speech::{
    NullSpeech, ScriptedSpeech, SpeakOutcome, SpeechEngine, SpeechLog, SpeechNotifier,
    SPEECH_INTERVAL,
};
