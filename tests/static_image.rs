use std::sync::{Arc, Mutex};

use scene_narrator::config::NarratorConfig;
use scene_narrator::{
    BoundingBox, Detection, DetectorBackend, Facing, Frame, NarratorSession, ScriptedBackend,
    ScriptedSpeech, SpeakOutcome, SpeechLog,
};

fn det(label: &str, confidence: f32) -> Detection {
    Detection::new(label, confidence, BoundingBox::new(4.0, 4.0, 24.0, 24.0))
}

fn session_with(backend: ScriptedBackend) -> (NarratorSession, SpeechLog) {
    let cfg = NarratorConfig::default();
    let detector: Arc<Mutex<dyn DetectorBackend>> = Arc::new(Mutex::new(backend));
    let (engine, log) = ScriptedSpeech::new();
    (NarratorSession::new(&cfg, detector, Box::new(engine)), log)
}

fn dark_frame(width: u32, height: u32) -> Frame {
    Frame::from_rgb8(vec![0u8; (width * height * 3) as usize], width, height).unwrap()
}

#[test]
fn analysis_reports_and_announces_confident_labels() {
    let backend = ScriptedBackend::fixed(vec![
        det("cat", 0.9),
        det("cat", 0.8),
        det("dog", 0.7),
        det("bird", 0.3),
    ]);
    let (mut session, log) = session_with(backend);

    let report = session.analyze_image(&dark_frame(64, 64)).unwrap();

    assert_eq!(report.status, "Detected: cat, dog");
    assert_eq!(report.labels, vec!["cat", "dog"]);
    assert_eq!(report.speech, SpeakOutcome::Spoken);
    assert_eq!(log.spoken(), vec!["I see cat and dog"]);
    assert_eq!(session.status(), "Detected: cat, dog");
}

#[test]
fn analysis_speaks_even_in_rapid_succession() {
    let backend = ScriptedBackend::fixed(vec![det("cat", 0.9)])
        .push_detections(vec![det("cat", 0.9)]);
    let (mut session, log) = session_with(backend);

    session.analyze_image(&dark_frame(64, 64)).unwrap();
    session.analyze_image(&dark_frame(64, 64)).unwrap();

    // No throttle for one-shot analysis; prior speech is cancelled each time.
    assert_eq!(log.spoken(), vec!["I see cat", "I see cat"]);
    assert_eq!(log.cancels(), 2);
}

#[test]
fn low_confidence_analysis_stays_silent() {
    let backend = ScriptedBackend::fixed(vec![det("cat", 0.4), det("dog", 0.2)]);
    let (mut session, log) = session_with(backend);

    let report = session.analyze_image(&dark_frame(64, 64)).unwrap();

    assert_eq!(report.status, "No objects detected with high confidence.");
    assert!(report.labels.is_empty());
    assert_eq!(report.speech, SpeakOutcome::NothingToSay);
    assert!(log.spoken().is_empty());
}

#[test]
fn analysis_releases_the_live_camera() {
    let (mut session, _log) = session_with(ScriptedBackend::fixed(vec![det("cat", 0.9)]));
    session.start_live(Facing::Back).unwrap();
    assert!(session.is_live());

    session.analyze_image(&dark_frame(64, 64)).unwrap();
    assert!(!session.is_live());
}

#[test]
fn analyzes_an_image_file_and_writes_a_snapshot() {
    let dir = tempfile::tempdir().expect("temp dir");
    let input = dir.path().join("scene.png");
    image::RgbImage::new(48, 48).save(&input).expect("write input");

    let (mut session, log) = session_with(ScriptedBackend::fixed(vec![det("cat", 0.9)]));
    let report = session.analyze_image_file(&input).unwrap();
    assert_eq!(report.status, "Detected: cat");
    assert_eq!(log.spoken(), vec!["I see cat"]);
    assert_eq!(report.annotated.dimensions(), (48, 48));

    let output = dir.path().join("annotated.png");
    session.snapshot(&output).unwrap();
    let reloaded = image::open(&output).expect("reload annotated").to_rgb8();
    assert_eq!(reloaded.dimensions(), (48, 48));
    // The box outline survives the round trip.
    assert_eq!(reloaded.get_pixel(4, 4).0, [0, 255, 0]);
}

#[test]
fn missing_image_file_is_an_error() {
    let (mut session, log) = session_with(ScriptedBackend::empty());
    assert!(session.analyze_image_file("/nonexistent/scene.png").is_err());
    assert!(log.spoken().is_empty());
}

#[test]
fn snapshot_before_any_analysis_is_an_error() {
    let (session, _log) = session_with(ScriptedBackend::empty());
    assert!(session.snapshot("/tmp/never_written.png").is_err());
}
