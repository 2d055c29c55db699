mod backend;
mod backends;
mod labels;
mod registry;
mod result;

pub use backend::DetectorBackend;
pub use backends::{LumaBackend, ScriptedBackend};
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use labels::{label_for_class, COCO_LABELS};
pub use registry::BackendRegistry;
pub use result::{labels_above, BoundingBox, Detection};

use std::time::Duration;

use anyhow::{anyhow, Result};

/// Bounded-retry loader for detector construction.
///
/// Model loading is the one failure that prevents the loop from ever
/// starting, so it gets retries with doubling backoff; after the last
/// attempt the error is terminal and must be surfaced to the user.
pub fn load_with_retry<T>(
    what: &str,
    attempts: u32,
    initial_backoff: Duration,
    mut load: impl FnMut() -> Result<T>,
) -> Result<T> {
    if attempts == 0 {
        return Err(anyhow!("{}: at least one load attempt is required", what));
    }
    let mut backoff = initial_backoff;
    let mut last_err = None;
    for attempt in 1..=attempts {
        match load() {
            Ok(value) => return Ok(value),
            Err(err) => {
                log::warn!("{} load attempt {}/{} failed: {}", what, attempt, attempts, err);
                last_err = Some(err);
                if attempt < attempts {
                    std::thread::sleep(backoff);
                    backoff = backoff.saturating_mul(2);
                }
            }
        }
    }
    Err(last_err.unwrap_or_else(|| anyhow!("{} failed to load", what)))
}
