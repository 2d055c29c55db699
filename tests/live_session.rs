use std::sync::{Arc, Mutex};

use scene_narrator::config::NarratorConfig;
use scene_narrator::{
    BoundingBox, Detection, DetectorBackend, Facing, NarratorSession, ScriptedBackend,
    ScriptedSpeech, SpeakOutcome, SpeechLog, TickOutcome,
};

fn det(label: &str, confidence: f32) -> Detection {
    Detection::new(label, confidence, BoundingBox::new(8.0, 8.0, 32.0, 32.0))
}

fn session_with(backend: ScriptedBackend) -> (NarratorSession, SpeechLog) {
    let cfg = NarratorConfig::default();
    let detector: Arc<Mutex<dyn DetectorBackend>> = Arc::new(Mutex::new(backend));
    let (engine, log) = ScriptedSpeech::new();
    (NarratorSession::new(&cfg, detector, Box::new(engine)), log)
}

#[test]
fn tick_detects_renders_and_speaks() {
    let backend = ScriptedBackend::fixed(vec![
        det("cat", 0.9),
        det("cat", 0.5),
        det("dog", 0.7),
    ]);
    let (mut session, log) = session_with(backend);
    session.start_live(Facing::Back).unwrap();

    let outcome = session.tick();
    assert_eq!(
        outcome,
        TickOutcome::Ran {
            detections: 3,
            drawn: 2,
            speech: SpeakOutcome::Spoken,
        }
    );
    assert_eq!(session.status(), "Objects detected: cat, dog");
    assert_eq!(log.spoken(), vec!["Detected cat and dog"]);

    // The permit is released once the pass completes.
    assert!(!session.is_detecting());

    // Same scene on the next pass: rendered again, speech suppressed.
    let outcome = session.tick();
    assert_eq!(
        outcome,
        TickOutcome::Ran {
            detections: 3,
            drawn: 2,
            speech: SpeakOutcome::SameSentence,
        }
    );
    assert_eq!(log.spoken().len(), 1);
}

#[test]
fn tick_without_camera_is_inactive() {
    let (mut session, log) = session_with(ScriptedBackend::fixed(vec![det("cat", 0.9)]));
    assert_eq!(session.tick(), TickOutcome::Inactive);
    assert!(log.spoken().is_empty());
}

#[test]
fn detector_failure_skips_the_cycle_and_recovers() {
    let backend = ScriptedBackend::fixed(vec![det("cat", 0.9)]).push_failure("inference exploded");
    let (mut session, log) = session_with(backend);
    session.start_live(Facing::Back).unwrap();

    assert_eq!(session.tick(), TickOutcome::DetectorFailed);
    assert!(!session.is_detecting());
    assert!(log.spoken().is_empty());

    // Next pass runs normally off the fallback script.
    assert!(matches!(session.tick(), TickOutcome::Ran { .. }));
    assert_eq!(log.spoken(), vec!["Detected cat"]);
}

#[test]
fn toggling_switches_facing_and_keeps_one_stream() {
    let (mut session, _log) = session_with(ScriptedBackend::empty());
    session.start_live(Facing::Back).unwrap();
    assert_eq!(session.facing(), Facing::Back);

    let facing = session.toggle_camera().unwrap();
    assert_eq!(facing, Facing::Front);
    assert!(session.is_live());
    assert_eq!(
        session.capture().active().unwrap().device(),
        "stub://front"
    );

    session.stop();
    assert!(!session.is_live());
}

#[test]
fn camera_failure_surfaces_on_the_status_line() {
    let mut cfg = NarratorConfig::default();
    cfg.camera.front_device = String::new();
    let detector: Arc<Mutex<dyn DetectorBackend>> =
        Arc::new(Mutex::new(ScriptedBackend::empty()));
    let (engine, _log) = ScriptedSpeech::new();
    let mut session = NarratorSession::new(&cfg, detector, Box::new(engine));

    assert!(session.start_live(Facing::Front).is_err());
    assert!(!session.is_live());
    assert!(session.status().starts_with("Error accessing the camera:"));
}

#[test]
fn no_detections_reports_nothing_detected() {
    let (mut session, log) = session_with(ScriptedBackend::empty());
    session.start_live(Facing::Back).unwrap();

    let outcome = session.tick();
    assert_eq!(
        outcome,
        TickOutcome::Ran {
            detections: 0,
            drawn: 0,
            speech: SpeakOutcome::NothingToSay,
        }
    );
    assert_eq!(session.status(), "No objects detected.");
    assert!(log.spoken().is_empty());
}
