use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::capture::{CameraConfig, Facing};

const DEFAULT_DRAW_THRESHOLD: f32 = 0.6;
const DEFAULT_SPEAK_THRESHOLD: f32 = 0.6;
const DEFAULT_SPEECH_INTERVAL_MS: u64 = 2000;
const DEFAULT_LANG: &str = "en-US";
const DEFAULT_MODEL_INPUT: u32 = 300;

#[derive(Debug, Deserialize, Default)]
struct NarratorConfigFile {
    camera: Option<CameraConfigFile>,
    thresholds: Option<ThresholdConfigFile>,
    speech: Option<SpeechConfigFile>,
    detector: Option<DetectorConfigFile>,
    render: Option<RenderConfigFile>,
    snapshot_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    front_device: Option<String>,
    back_device: Option<String>,
    facing: Option<Facing>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct ThresholdConfigFile {
    draw: Option<f32>,
    speak: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct SpeechConfigFile {
    interval_ms: Option<u64>,
    lang: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    backend: Option<String>,
    model_path: Option<PathBuf>,
    input_width: Option<u32>,
    input_height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct RenderConfigFile {
    font_path: Option<PathBuf>,
}

/// Confidence thresholds. Draw and speak are independent knobs that happen
/// to share a default.
#[derive(Clone, Copy, Debug)]
pub struct Thresholds {
    pub draw: f32,
    pub speak: f32,
}

#[derive(Clone, Debug)]
pub struct SpeechSettings {
    pub interval: Duration,
    pub lang: String,
}

#[derive(Clone, Debug)]
pub struct DetectorSettings {
    /// Backend name; None selects the registry default.
    pub backend: Option<String>,
    /// ONNX model path for the tract backend.
    pub model_path: Option<PathBuf>,
    pub input_width: u32,
    pub input_height: u32,
}

#[derive(Clone, Debug)]
pub struct NarratorConfig {
    pub camera: CameraConfig,
    pub facing: Facing,
    pub thresholds: Thresholds,
    pub speech: SpeechSettings,
    pub detector: DetectorSettings,
    pub font_path: Option<PathBuf>,
    pub snapshot_dir: Option<PathBuf>,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            facing: Facing::default(),
            thresholds: Thresholds {
                draw: DEFAULT_DRAW_THRESHOLD,
                speak: DEFAULT_SPEAK_THRESHOLD,
            },
            speech: SpeechSettings {
                interval: Duration::from_millis(DEFAULT_SPEECH_INTERVAL_MS),
                lang: DEFAULT_LANG.to_string(),
            },
            detector: DetectorSettings {
                backend: None,
                model_path: None,
                input_width: DEFAULT_MODEL_INPUT,
                input_height: DEFAULT_MODEL_INPUT,
            },
            font_path: None,
            snapshot_dir: None,
        }
    }
}

impl NarratorConfig {
    /// Load from the file named by `NARRATOR_CONFIG` (JSON, all fields
    /// optional), apply `NARRATOR_*` environment overrides, and validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("NARRATOR_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: NarratorConfigFile) -> Self {
        let mut cfg = Self::default();
        if let Some(camera) = file.camera {
            if let Some(device) = camera.front_device {
                cfg.camera.front_device = device;
            }
            if let Some(device) = camera.back_device {
                cfg.camera.back_device = device;
            }
            if let Some(facing) = camera.facing {
                cfg.facing = facing;
            }
            if let Some(fps) = camera.target_fps {
                cfg.camera.target_fps = fps;
            }
            if let Some(width) = camera.width {
                cfg.camera.width = width;
            }
            if let Some(height) = camera.height {
                cfg.camera.height = height;
            }
        }
        if let Some(thresholds) = file.thresholds {
            if let Some(draw) = thresholds.draw {
                cfg.thresholds.draw = draw;
            }
            if let Some(speak) = thresholds.speak {
                cfg.thresholds.speak = speak;
            }
        }
        if let Some(speech) = file.speech {
            if let Some(interval_ms) = speech.interval_ms {
                cfg.speech.interval = Duration::from_millis(interval_ms);
            }
            if let Some(lang) = speech.lang {
                cfg.speech.lang = lang;
            }
        }
        if let Some(detector) = file.detector {
            cfg.detector.backend = detector.backend.or(cfg.detector.backend);
            cfg.detector.model_path = detector.model_path.or(cfg.detector.model_path);
            if let Some(width) = detector.input_width {
                cfg.detector.input_width = width;
            }
            if let Some(height) = detector.input_height {
                cfg.detector.input_height = height;
            }
        }
        if let Some(render) = file.render {
            cfg.font_path = render.font_path.or(cfg.font_path);
        }
        cfg.snapshot_dir = file.snapshot_dir.or(cfg.snapshot_dir);
        cfg
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(device) = std::env::var("NARRATOR_FRONT_DEVICE") {
            if !device.trim().is_empty() {
                self.camera.front_device = device;
            }
        }
        if let Ok(device) = std::env::var("NARRATOR_BACK_DEVICE") {
            if !device.trim().is_empty() {
                self.camera.back_device = device;
            }
        }
        if let Ok(facing) = std::env::var("NARRATOR_FACING") {
            match facing.trim().to_lowercase().as_str() {
                "" => {}
                "front" => self.facing = Facing::Front,
                "back" => self.facing = Facing::Back,
                other => return Err(anyhow!("NARRATOR_FACING must be front or back, got {}", other)),
            }
        }
        if let Ok(value) = std::env::var("NARRATOR_DRAW_THRESHOLD") {
            self.thresholds.draw = parse_f32("NARRATOR_DRAW_THRESHOLD", &value)?;
        }
        if let Ok(value) = std::env::var("NARRATOR_SPEAK_THRESHOLD") {
            self.thresholds.speak = parse_f32("NARRATOR_SPEAK_THRESHOLD", &value)?;
        }
        if let Ok(value) = std::env::var("NARRATOR_SPEECH_INTERVAL_MS") {
            let ms: u64 = value
                .parse()
                .map_err(|_| anyhow!("NARRATOR_SPEECH_INTERVAL_MS must be an integer"))?;
            self.speech.interval = Duration::from_millis(ms);
        }
        if let Ok(lang) = std::env::var("NARRATOR_LANG") {
            if !lang.trim().is_empty() {
                self.speech.lang = lang;
            }
        }
        if let Ok(backend) = std::env::var("NARRATOR_BACKEND") {
            if !backend.trim().is_empty() {
                self.detector.backend = Some(backend);
            }
        }
        if let Ok(path) = std::env::var("NARRATOR_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.detector.model_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(path) = std::env::var("NARRATOR_FONT_PATH") {
            if !path.trim().is_empty() {
                self.font_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(path) = std::env::var("NARRATOR_SNAPSHOT_DIR") {
            if !path.trim().is_empty() {
                self.snapshot_dir = Some(PathBuf::from(path));
            }
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        for (name, value) in [
            ("draw threshold", self.thresholds.draw),
            ("speak threshold", self.thresholds.speak),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(anyhow!("{} must be within [0, 1], got {}", name, value));
            }
        }
        if self.camera.target_fps == 0 {
            return Err(anyhow!("camera target_fps must be >= 1"));
        }
        if self.camera.width < 16 || self.camera.height < 16 {
            return Err(anyhow!("camera resolution hint must be at least 16x16"));
        }
        if self.speech.interval.is_zero() {
            return Err(anyhow!("speech interval must be greater than zero"));
        }
        if self.detector.input_width == 0 || self.detector.input_height == 0 {
            return Err(anyhow!("detector input size must be nonzero"));
        }
        Ok(())
    }
}

fn parse_f32(name: &str, value: &str) -> Result<f32> {
    value
        .parse()
        .map_err(|_| anyhow!("{} must be a number, got {}", name, value))
}

fn read_config_file(path: &Path) -> Result<NarratorConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
