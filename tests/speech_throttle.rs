use std::time::{Duration, Instant};

use scene_narrator::{
    BoundingBox, Detection, ScriptedSpeech, SpeakOutcome, SpeechNotifier, SPEECH_INTERVAL,
};

fn det(label: &str, confidence: f32) -> Detection {
    Detection::new(label, confidence, BoundingBox::new(0.0, 0.0, 10.0, 10.0))
}

#[test]
fn repeated_sentence_is_suppressed_until_it_changes() {
    let (engine, log) = ScriptedSpeech::new();
    let mut notifier = SpeechNotifier::new(Box::new(engine));
    let base = Instant::now();
    let cat = vec![det("cat", 0.9)];

    assert_eq!(notifier.notify_at(base, &cat, 0.6), SpeakOutcome::Spoken);

    // Same sentence stays suppressed even long after the interval.
    let much_later = base + SPEECH_INTERVAL * 10;
    assert_eq!(
        notifier.notify_at(much_later, &cat, 0.6),
        SpeakOutcome::SameSentence
    );

    let dog = vec![det("dog", 0.9)];
    assert_eq!(notifier.notify_at(much_later, &dog, 0.6), SpeakOutcome::Spoken);

    // The earlier sentence is new again once something else was spoken.
    let later_still = much_later + SPEECH_INTERVAL;
    assert_eq!(notifier.notify_at(later_still, &cat, 0.6), SpeakOutcome::Spoken);

    assert_eq!(log.spoken(), vec!["Detected cat", "Detected dog", "Detected cat"]);
}

#[test]
fn interval_gates_a_changed_sentence() {
    let (engine, log) = ScriptedSpeech::new();
    let mut notifier = SpeechNotifier::new(Box::new(engine));
    let base = Instant::now();

    assert_eq!(
        notifier.notify_at(base, &[det("cat", 0.9)], 0.6),
        SpeakOutcome::Spoken
    );

    // A different sentence half a second later is still throttled.
    assert_eq!(
        notifier.notify_at(
            base + Duration::from_millis(500),
            &[det("dog", 0.9)],
            0.6
        ),
        SpeakOutcome::IntervalNotElapsed
    );

    // Once the interval elapses it goes through.
    assert_eq!(
        notifier.notify_at(base + SPEECH_INTERVAL, &[det("dog", 0.9)], 0.6),
        SpeakOutcome::Spoken
    );
    assert_eq!(log.spoken(), vec!["Detected cat", "Detected dog"]);
}

#[test]
fn busy_engine_does_not_consume_the_interval() {
    let (engine, log) = ScriptedSpeech::new();
    let mut notifier = SpeechNotifier::new(Box::new(engine));
    let base = Instant::now();

    assert_eq!(
        notifier.notify_at(base, &[det("cat", 0.9)], 0.6),
        SpeakOutcome::Spoken
    );

    log.set_busy(true);
    let later = base + SPEECH_INTERVAL;
    assert_eq!(
        notifier.notify_at(later, &[det("dog", 0.9)], 0.6),
        SpeakOutcome::EngineBusy
    );

    // Becoming idle lets the very next cycle speak; throttle state was not
    // advanced by the busy attempt.
    log.set_busy(false);
    assert_eq!(
        notifier.notify_at(later + Duration::from_millis(1), &[det("dog", 0.9)], 0.6),
        SpeakOutcome::Spoken
    );
    assert_eq!(log.spoken(), vec!["Detected cat", "Detected dog"]);
}

#[test]
fn sentence_joins_labels_with_and() {
    let (engine, log) = ScriptedSpeech::new();
    let mut notifier = SpeechNotifier::new(Box::new(engine));

    let detections = vec![det("person", 0.95), det("bicycle", 0.8), det("dog", 0.7)];
    assert_eq!(
        notifier.notify_at(Instant::now(), &detections, 0.6),
        SpeakOutcome::Spoken
    );
    assert_eq!(log.spoken(), vec!["Detected person and bicycle and dog"]);
}

#[test]
fn below_threshold_labels_never_reach_the_engine() {
    let (engine, log) = ScriptedSpeech::new();
    let mut notifier = SpeechNotifier::new(Box::new(engine));

    let detections = vec![det("cat", 0.59), det("dog", 0.3)];
    assert_eq!(
        notifier.notify_at(Instant::now(), &detections, 0.6),
        SpeakOutcome::NothingToSay
    );
    assert!(log.spoken().is_empty());
    assert_eq!(log.cancels(), 0);
}
