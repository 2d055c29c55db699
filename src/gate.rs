//! Single-permit re-entrancy gate for the detection loop.
//!
//! The live loop must never have two detection calls in flight. The gate
//! makes that invariant a primitive: `try_acquire` hands out at most one
//! `DetectPermit`, and dropping the permit releases the gate on every exit
//! path, success or failure.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct DetectGate {
    busy: AtomicBool,
}

impl DetectGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the single permit. Returns `None` while a permit is live.
    pub fn try_acquire(&self) -> Option<DetectPermit<'_>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            Some(DetectPermit { gate: self })
        } else {
            None
        }
    }

    /// True while a permit is live.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// RAII permit; releasing is dropping.
#[derive(Debug)]
pub struct DetectPermit<'a> {
    gate: &'a DetectGate,
}

impl Drop for DetectPermit<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_permit_only() {
        let gate = DetectGate::new();
        assert!(!gate.is_busy());

        let permit = gate.try_acquire().expect("first acquire");
        assert!(gate.is_busy());
        assert!(gate.try_acquire().is_none());

        drop(permit);
        assert!(!gate.is_busy());
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn permit_releases_on_error_paths() {
        let gate = DetectGate::new();
        let result: anyhow::Result<()> = (|| {
            let _permit = gate.try_acquire().expect("acquire");
            anyhow::bail!("detector failed");
        })();
        assert!(result.is_err());
        assert!(!gate.is_busy(), "permit must release when the call unwinds");
    }
}
