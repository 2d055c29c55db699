//! narrate_image - one-shot detection and narration for a still image

use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;

use scene_narrator::ui::Ui;
use scene_narrator::{
    config::NarratorConfig, BackendRegistry, LumaBackend, NarratorSession, NullSpeech,
    SpeechEngine,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Image file to analyze (JPEG or PNG).
    image: PathBuf,
    /// Where to write the annotated copy; omit to skip writing.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Confidence threshold for both boxes and speech.
    #[arg(long)]
    threshold: Option<f32>,
    /// Detector backend name; defaults to the configured or registry default.
    #[arg(long)]
    backend: Option<String>,
    /// ONNX model path for the tract backend.
    #[arg(long)]
    model_path: Option<PathBuf>,
    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let is_tty = std::io::stderr().is_terminal();
    let ui = Ui::from_flag(Some(&args.ui), is_tty);

    let mut cfg = NarratorConfig::load()?;
    if let Some(threshold) = args.threshold {
        cfg.thresholds.draw = threshold;
        cfg.thresholds.speak = threshold;
    }
    if let Some(backend) = args.backend {
        cfg.detector.backend = Some(backend);
    }
    if let Some(path) = args.model_path {
        cfg.detector.model_path = Some(path);
    }

    let mut session = {
        let _stage = ui.stage("Load detector");
        let registry = build_registry(&cfg)?;
        let detector = registry.select(cfg.detector.backend.as_deref())?;
        let engine = build_speech_engine(&cfg);
        let mut session = NarratorSession::new(&cfg, detector, engine);
        session.warm_up()?;
        session
    };

    let report = {
        let _stage = ui.stage("Analyze image");
        session.analyze_image_file(&args.image)?
    };

    if let Some(output) = &args.output {
        let _stage = ui.stage("Write annotated image");
        session.snapshot(output)?;
    }

    println!("{}", report.status);
    for label in &report.labels {
        println!("  - {}", label);
    }
    Ok(())
}

fn build_registry(cfg: &NarratorConfig) -> Result<BackendRegistry> {
    let mut registry = BackendRegistry::new();
    registry.register(LumaBackend::new());

    #[cfg(feature = "backend-tract")]
    if let Some(model_path) = &cfg.detector.model_path {
        let backoff = std::time::Duration::from_millis(500);
        let backend = scene_narrator::load_with_retry("onnx model", 3, backoff, || {
            scene_narrator::TractBackend::new(
                model_path,
                cfg.detector.input_width,
                cfg.detector.input_height,
            )
        })?;
        registry.register(backend);
        registry.set_default(scene_narrator::TractBackend::NAME)?;
    }
    #[cfg(not(feature = "backend-tract"))]
    if cfg.detector.model_path.is_some() {
        log::warn!("model path configured but this build lacks the backend-tract feature");
    }

    Ok(registry)
}

fn build_speech_engine(cfg: &NarratorConfig) -> Box<dyn SpeechEngine> {
    #[cfg(feature = "speech-tts")]
    match scene_narrator::SystemSpeech::new(&cfg.speech.lang) {
        Ok(engine) => return Box::new(engine),
        Err(e) => log::warn!("platform speech unavailable, logging instead: {}", e),
    }
    let _ = &cfg.speech.lang;
    Box::new(NullSpeech)
}
