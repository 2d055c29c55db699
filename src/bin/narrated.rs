//! narrated - live scene narration daemon
//!
//! This daemon:
//! 1. Acquires the configured camera (front or back facing)
//! 2. Runs the detector on each captured frame, one pass at a time
//! 3. Renders bounding boxes and a status line over the frame
//! 4. Speaks a summary sentence, throttled by content, time, and engine
//!    idleness
//! 5. Periodically reports camera health and writes annotated snapshots

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use scene_narrator::{
    config::NarratorConfig, BackendRegistry, Facing, LumaBackend, NarratorSession, NullSpeech,
    SpeechEngine, TickOutcome,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Camera to start with (front|back); defaults to the configured facing.
    #[arg(long)]
    facing: Option<String>,
    /// Detector backend name; defaults to the configured or registry default.
    #[arg(long)]
    backend: Option<String>,
    /// ONNX model path for the tract backend.
    #[arg(long)]
    model_path: Option<PathBuf>,
    /// Stop after this many loop passes (0 runs until Ctrl-C).
    #[arg(long, default_value_t = 0)]
    ticks: u64,
    /// Directory for periodic annotated snapshots.
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,
    /// Seconds between annotated snapshots (requires a snapshot directory).
    #[arg(long, default_value_t = 30)]
    snapshot_every_s: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = NarratorConfig::load()?;
    if let Some(facing) = args.facing.as_deref() {
        cfg.facing = parse_facing(facing)?;
    }
    if let Some(backend) = args.backend {
        cfg.detector.backend = Some(backend);
    }
    if let Some(path) = args.model_path {
        cfg.detector.model_path = Some(path);
    }
    if let Some(dir) = args.snapshot_dir {
        cfg.snapshot_dir = Some(dir);
    }

    let registry = build_registry(&cfg)?;
    let detector = registry.select(cfg.detector.backend.as_deref())?;
    let engine = build_speech_engine(&cfg);

    let mut session = NarratorSession::new(&cfg, detector, engine);
    session.warm_up()?;
    session.start_live(cfg.facing)?;
    log::info!(
        "narrating from the {} camera ({})",
        session.facing().as_str(),
        cfg.camera.device_for(session.facing())
    );

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
        })
        .map_err(|e| anyhow!("failed to install shutdown handler: {}", e))?;
    }

    let frame_period = Duration::from_secs(1) / cfg.camera.target_fps.max(1);
    let snapshot_period = Duration::from_secs(args.snapshot_every_s.max(1));
    let mut last_health_log = Instant::now();
    let mut last_snapshot = Instant::now();
    let mut ticks = 0u64;
    let mut frames = 0u64;

    while running.load(Ordering::SeqCst) {
        let started = Instant::now();
        match session.tick() {
            TickOutcome::Ran {
                detections,
                drawn,
                speech,
            } => {
                frames += 1;
                log::debug!(
                    "tick: detections={} drawn={} speech={:?} status={:?}",
                    detections,
                    drawn,
                    speech,
                    session.status()
                );
            }
            TickOutcome::Busy => log::debug!("tick skipped: detection in flight"),
            TickOutcome::Inactive => {
                log::warn!("camera inactive, attempting restart");
                let facing = session.facing();
                if session.start_live(facing).is_err() {
                    log::error!("{}", session.status());
                    std::thread::sleep(Duration::from_secs(1));
                }
            }
            TickOutcome::FrameFailed | TickOutcome::DetectorFailed => {
                // Already logged; the next pass retries.
            }
        }

        if last_health_log.elapsed() >= Duration::from_secs(5) {
            if let Some(source) = session.capture().active() {
                let stats = source.stats();
                log::info!(
                    "camera health={} frames={} device={} status={:?}",
                    source.is_healthy(),
                    stats.frames_captured,
                    stats.device,
                    session.status()
                );
            }
            last_health_log = Instant::now();
        }

        if let Some(dir) = &cfg.snapshot_dir {
            if last_snapshot.elapsed() >= snapshot_period {
                let path = dir.join(format!("narrated_{:06}.png", frames));
                if let Err(e) = session.snapshot(&path) {
                    log::warn!("snapshot failed: {}", e);
                }
                last_snapshot = Instant::now();
            }
        }

        ticks += 1;
        if args.ticks > 0 && ticks >= args.ticks {
            break;
        }
        if let Some(remaining) = frame_period.checked_sub(started.elapsed()) {
            std::thread::sleep(remaining);
        }
    }

    log::info!("shutting down after {} frames", frames);
    session.stop();
    Ok(())
}

fn parse_facing(value: &str) -> Result<Facing> {
    match value.trim().to_lowercase().as_str() {
        "front" => Ok(Facing::Front),
        "back" => Ok(Facing::Back),
        other => Err(anyhow!("facing must be front or back, got {}", other)),
    }
}

fn build_registry(cfg: &NarratorConfig) -> Result<BackendRegistry> {
    let mut registry = BackendRegistry::new();
    registry.register(LumaBackend::new());
    registry.set_default(LumaBackend::NAME)?;

    #[cfg(feature = "backend-tract")]
    if let Some(model_path) = &cfg.detector.model_path {
        let backend =
            scene_narrator::load_with_retry("onnx model", 3, Duration::from_millis(500), || {
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
