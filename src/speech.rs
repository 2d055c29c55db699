//! Spoken feedback.
//!
//! `SpeechEngine` is the seam to the platform speech synthesizer: speak,
//! cancel, and an idle check. `SpeechNotifier` sits on top and owns the
//! throttle state: a sentence is spoken only when it differs from the last
//! spoken sentence, the speech interval has elapsed, and the engine is idle.
//! Any in-flight utterance is cancelled right before a new speak attempt so
//! speech never stacks. Throttle state is updated only when a speak attempt
//! succeeds; a failed attempt leaves it unchanged so a later cycle can retry.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::detect::{labels_above, Detection};

/// Default minimum time between spoken sentences.
pub const SPEECH_INTERVAL: Duration = Duration::from_millis(2000);

/// Platform speech synthesizer seam.
pub trait SpeechEngine: Send {
    /// Queue `text` for speaking. Asynchronous; returns once queued.
    fn speak(&mut self, text: &str) -> Result<()>;

    /// Cancel any in-flight or queued utterance. Safe when idle.
    fn cancel(&mut self) -> Result<()>;

    /// True while the engine is speaking or has queued speech.
    fn is_speaking(&self) -> Result<bool>;
}

/// Outcome of one notify/announce attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeakOutcome {
    /// Sentence was handed to the engine; throttle state updated.
    Spoken,
    /// No labels above threshold; nothing attempted.
    NothingToSay,
    /// Same sentence as last time; suppressed.
    SameSentence,
    /// Interval since the last spoken sentence has not elapsed.
    IntervalNotElapsed,
    /// Engine still speaking (or its idle check failed).
    EngineBusy,
    /// Engine rejected the utterance; throttle state unchanged.
    Failed,
}

pub struct SpeechNotifier {
    engine: Box<dyn SpeechEngine>,
    interval: Duration,
    last_sentence: Option<String>,
    last_spoken_at: Option<Instant>,
}

impl SpeechNotifier {
    pub fn new(engine: Box<dyn SpeechEngine>) -> Self {
        Self {
            engine,
            interval: SPEECH_INTERVAL,
            last_sentence: None,
            last_spoken_at: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Speak the deduplicated label set above `threshold` as
    /// "Detected a and b", subject to the throttle.
    pub fn notify(&mut self, detections: &[Detection], threshold: f32) -> SpeakOutcome {
        self.notify_at(Instant::now(), detections, threshold)
    }

    /// `notify` with an injected clock, so tests can exercise the interval
    /// rule without sleeping.
    pub fn notify_at(
        &mut self,
        now: Instant,
        detections: &[Detection],
        threshold: f32,
    ) -> SpeakOutcome {
        let labels = labels_above(detections, threshold);
        if labels.is_empty() {
            return SpeakOutcome::NothingToSay;
        }
        let sentence = format!("Detected {}", labels.join(" and "));
        self.try_speak_at(now, &sentence)
    }

    fn try_speak_at(&mut self, now: Instant, sentence: &str) -> SpeakOutcome {
        if self.last_sentence.as_deref() == Some(sentence) {
            return SpeakOutcome::SameSentence;
        }
        if let Some(last) = self.last_spoken_at {
            if now.duration_since(last) < self.interval {
                return SpeakOutcome::IntervalNotElapsed;
            }
        }
        match self.engine.is_speaking() {
            Ok(false) => {}
            Ok(true) => return SpeakOutcome::EngineBusy,
            Err(err) => {
                log::warn!("speech idle check failed: {}", err);
                return SpeakOutcome::EngineBusy;
            }
        }

        if let Err(err) = self.engine.cancel() {
            log::warn!("speech cancel failed: {}", err);
        }
        match self.engine.speak(sentence) {
            Ok(()) => {
                self.last_sentence = Some(sentence.to_string());
                self.last_spoken_at = Some(now);
                SpeakOutcome::Spoken
            }
            Err(err) => {
                log::warn!("speech synthesis failed: {}", err);
                SpeakOutcome::Failed
            }
        }
    }

    /// Speak `sentence` unconditionally, cancelling any prior speech first.
    /// Used by static-image analysis; does not touch throttle state.
    pub fn announce(&mut self, sentence: &str) -> SpeakOutcome {
        if let Err(err) = self.engine.cancel() {
            log::warn!("speech cancel failed: {}", err);
        }
        match self.engine.speak(sentence) {
            Ok(()) => SpeakOutcome::Spoken,
            Err(err) => {
                log::warn!("speech synthesis failed: {}", err);
                SpeakOutcome::Failed
            }
        }
    }

    /// Cancel any in-flight speech (session shutdown).
    pub fn cancel(&mut self) {
        if let Err(err) = self.engine.cancel() {
            log::warn!("speech cancel failed: {}", err);
        }
    }

    pub fn last_sentence(&self) -> Option<&str> {
        self.last_sentence.as_deref()
    }
}

// ----------------------------------------------------------------------------
// Engines
// ----------------------------------------------------------------------------

/// Engine that logs instead of speaking. Default for builds without the
/// speech-tts feature.
#[derive(Default)]
pub struct NullSpeech;

impl SpeechEngine for NullSpeech {
    fn speak(&mut self, text: &str) -> Result<()> {
        log::info!("(speech) {}", text);
        Ok(())
    }

    fn cancel(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_speaking(&self) -> Result<bool> {
        Ok(false)
    }
}

#[derive(Default)]
struct ScriptedState {
    spoken: Vec<String>,
    cancels: u64,
    busy: bool,
    fail_next: bool,
}

/// Shared handle onto a `ScriptedSpeech` engine for test assertions.
#[derive(Clone, Default)]
pub struct SpeechLog {
    state: Arc<Mutex<ScriptedState>>,
}

impl SpeechLog {
    pub fn spoken(&self) -> Vec<String> {
        self.state.lock().unwrap().spoken.clone()
    }

    pub fn cancels(&self) -> u64 {
        self.state.lock().unwrap().cancels
    }

    pub fn set_busy(&self, busy: bool) {
        self.state.lock().unwrap().busy = busy;
    }

    pub fn fail_next_speak(&self) {
        self.state.lock().unwrap().fail_next = true;
    }
}

/// Recording engine for tests and demos.
pub struct ScriptedSpeech {
    state: Arc<Mutex<ScriptedState>>,
}

impl ScriptedSpeech {
    pub fn new() -> (Self, SpeechLog) {
        let log = SpeechLog::default();
        (
            Self {
                state: log.state.clone(),
            },
            log,
        )
    }
}

impl SpeechEngine for ScriptedSpeech {
    fn speak(&mut self, text: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_next {
            state.fail_next = false;
            anyhow::bail!("speech engine rejected utterance");
        }
        state.spoken.push(text.to_string());
        Ok(())
    }

    fn cancel(&mut self) -> Result<()> {
        self.state.lock().unwrap().cancels += 1;
        Ok(())
    }

    fn is_speaking(&self) -> Result<bool> {
        Ok(self.state.lock().unwrap().busy)
    }
}

/// True when a voice's BCP 47 tag satisfies the requested language: either an
/// exact match or the same primary subtag ("en-GB" satisfies "en").
#[cfg(any(test, feature = "speech-tts"))]
fn language_matches(voice_tag: &str, requested: &str) -> bool {
    let voice = voice_tag.trim().to_lowercase();
    let requested = requested.trim().to_lowercase();
    if requested.is_empty() {
        return false;
    }
    if voice == requested {
        return true;
    }
    let primary = |tag: &str| tag.split('-').next().unwrap_or(tag).to_string();
    primary(&voice) == primary(&requested)
}

/// Engine backed by the platform synthesizer through the `tts` crate.
#[cfg(feature = "speech-tts")]
pub struct SystemSpeech {
    tts: tts::Tts,
}

#[cfg(feature = "speech-tts")]
impl SystemSpeech {
    pub fn new(lang: &str) -> Result<Self> {
        let mut tts = tts::Tts::default()
            .map_err(|err| anyhow::anyhow!("failed to initialize speech engine: {}", err))?;

        if tts.supported_features().voice {
            match tts.voices() {
                Ok(voices) => {
                    let chosen = voices
                        .iter()
                        .find(|voice| language_matches(voice.language().as_str(), lang));
                    match chosen {
                        Some(voice) => match tts.set_voice(voice) {
                            Ok(()) => log::info!(
                                "speech voice {} selected for language {}",
                                voice.name(),
                                lang
                            ),
                            Err(err) => {
                                log::warn!("failed to select voice for {}: {}", lang, err)
                            }
                        },
                        None => log::warn!(
                            "no speech voice matches language {}; using platform default",
                            lang
                        ),
                    }
                }
                Err(err) => log::warn!("voice enumeration failed: {}", err),
            }
        } else {
            log::info!(
                "platform speech does not support voice selection; language {} ignored",
                lang
            );
        }
        Ok(Self { tts })
    }
}

#[cfg(feature = "speech-tts")]
impl SpeechEngine for SystemSpeech {
    fn speak(&mut self, text: &str) -> Result<()> {
        self.tts
            .speak(text, false)
            .map_err(|err| anyhow::anyhow!("speak failed: {}", err))?;
        Ok(())
    }

    fn cancel(&mut self) -> Result<()> {
        self.tts
            .stop()
            .map_err(|err| anyhow::anyhow!("stop failed: {}", err))?;
        Ok(())
    }

    fn is_speaking(&self) -> Result<bool> {
        self.tts
            .is_speaking()
            .map_err(|err| anyhow::anyhow!("idle check failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BoundingBox;

    fn det(label: &str, confidence: f32) -> Detection {
        Detection::new(label, confidence, BoundingBox::new(0.0, 0.0, 8.0, 8.0))
    }

    #[test]
    fn builds_sentence_from_deduplicated_labels() {
        let (engine, log) = ScriptedSpeech::new();
        let mut notifier = SpeechNotifier::new(Box::new(engine));

        let detections = vec![det("cat", 0.9), det("cat", 0.7), det("dog", 0.8)];
        assert_eq!(notifier.notify(&detections, 0.6), SpeakOutcome::Spoken);
        assert_eq!(log.spoken(), vec!["Detected cat and dog"]);
        // Cancel precedes every successful speak.
        assert_eq!(log.cancels(), 1);
    }

    #[test]
    fn empty_label_set_makes_no_attempt() {
        let (engine, log) = ScriptedSpeech::new();
        let mut notifier = SpeechNotifier::new(Box::new(engine));
        assert_eq!(notifier.notify(&[], 0.6), SpeakOutcome::NothingToSay);
        assert_eq!(
            notifier.notify(&[det("cat", 0.2)], 0.6),
            SpeakOutcome::NothingToSay
        );
        assert!(log.spoken().is_empty());
        assert_eq!(log.cancels(), 0);
    }

    #[test]
    fn failed_speak_leaves_throttle_state_unchanged() {
        let (engine, log) = ScriptedSpeech::new();
        let mut notifier = SpeechNotifier::new(Box::new(engine))
            .with_interval(Duration::from_millis(0));
        log.fail_next_speak();

        let detections = vec![det("cat", 0.9)];
        assert_eq!(notifier.notify(&detections, 0.6), SpeakOutcome::Failed);
        assert!(notifier.last_sentence().is_none());

        // Retry succeeds with the same sentence.
        assert_eq!(notifier.notify(&detections, 0.6), SpeakOutcome::Spoken);
        assert_eq!(log.spoken(), vec!["Detected cat"]);
    }

    #[test]
    fn busy_engine_suppresses_speech() {
        let (engine, log) = ScriptedSpeech::new();
        let mut notifier = SpeechNotifier::new(Box::new(engine));
        log.set_busy(true);
        assert_eq!(
            notifier.notify(&[det("cat", 0.9)], 0.6),
            SpeakOutcome::EngineBusy
        );
        assert!(log.spoken().is_empty());
    }

    #[test]
    fn voice_language_matching_accepts_exact_and_primary_subtag() {
        assert!(language_matches("en-US", "en-US"));
        assert!(language_matches("en-GB", "en-US"));
        assert!(language_matches("EN", "en-us"));
        assert!(!language_matches("fr-FR", "en-US"));
        assert!(!language_matches("en-US", ""));
    }

    #[test]
    fn announce_bypasses_throttle_and_cancels_first() {
        let (engine, log) = ScriptedSpeech::new();
        let mut notifier = SpeechNotifier::new(Box::new(engine));

        assert_eq!(notifier.announce("I see cat"), SpeakOutcome::Spoken);
        assert_eq!(notifier.announce("I see cat"), SpeakOutcome::Spoken);
        assert_eq!(log.spoken(), vec!["I see cat", "I see cat"]);
        assert_eq!(log.cancels(), 2);
        assert!(notifier.last_sentence().is_none());
    }
}
