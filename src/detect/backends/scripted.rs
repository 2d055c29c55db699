use std::collections::VecDeque;

use anyhow::{anyhow, Result};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;

enum Step {
    Detections(Vec<Detection>),
    Failure(String),
}

/// Scripted backend for tests and demos.
///
/// Plays back a queued sequence of detection results or failures; once the
/// queue is drained it returns the fallback result on every call.
pub struct ScriptedBackend {
    steps: VecDeque<Step>,
    fallback: Vec<Detection>,
    calls: u64,
}

impl ScriptedBackend {
    /// Backend that never detects anything.
    pub fn empty() -> Self {
        Self::fixed(Vec::new())
    }

    /// Backend that returns the same detections on every call.
    pub fn fixed(detections: Vec<Detection>) -> Self {
        Self {
            steps: VecDeque::new(),
            fallback: detections,
            calls: 0,
        }
    }

    /// Queue one successful detection result.
    pub fn push_detections(mut self, detections: Vec<Detection>) -> Self {
        self.steps.push_back(Step::Detections(detections));
        self
    }

    /// Queue one transient failure.
    pub fn push_failure(mut self, message: &str) -> Self {
        self.steps.push_back(Step::Failure(message.to_string()));
        self
    }

    /// Number of `detect` calls made so far.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl DetectorBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn detect(&mut self, _pixels: &[u8], _width: u32, _height: u32) -> Result<Vec<Detection>> {
        self.calls += 1;
        match self.steps.pop_front() {
            Some(Step::Detections(detections)) => Ok(detections),
            Some(Step::Failure(message)) => Err(anyhow!("{}", message)),
            None => Ok(self.fallback.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::result::BoundingBox;

    #[test]
    fn plays_back_script_then_fallback() {
        let cat = Detection::new("cat", 0.9, BoundingBox::new(1.0, 1.0, 5.0, 5.0));
        let mut backend = ScriptedBackend::fixed(vec![cat])
            .push_detections(Vec::new())
            .push_failure("inference exploded");

        assert!(backend.detect(&[], 0, 0).unwrap().is_empty());
        assert!(backend.detect(&[], 0, 0).is_err());
        assert_eq!(backend.detect(&[], 0, 0).unwrap()[0].label, "cat");
        assert_eq!(backend.calls(), 3);
    }
}
