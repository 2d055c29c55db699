use anyhow::Result;

use crate::detect::result::Detection;

/// Detector backend trait.
///
/// Implementations receive a packed RGB8 pixel slice and return the objects
/// found in it. The slice is read-only and ephemeral; backends must not
/// retain it beyond the `detect` call.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on a frame.
    ///
    /// Errors are transient from the caller's point of view: the detection
    /// loop logs them and skips the cycle, it never stops scheduling.
    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>>;

    /// Optional warm-up hook, invoked once before the loop starts.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
