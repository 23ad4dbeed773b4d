//! Progress callbacks and cooperative cancellation.
//!
//! Extraction can take a while on long videos, so the bundled extractors
//! accept an optional [`ProgressCallback`] and a cooperative
//! [`CancellationToken`] through their builder methods.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// The pipeline stage currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Stage {
    /// Scanning the video for scene cuts.
    SceneDetection,
    /// Decoding and saving representative frames.
    FrameExtraction,
    /// Assembling frame images into the output document.
    PdfAssembly,
}

/// A snapshot of pipeline progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Which stage is running.
    pub stage: Stage,
    /// Items completed so far (cuts found, frames written, pages added).
    pub current: u64,
    /// Total items expected, if known ahead of time. Unknown during scene
    /// detection, known during frame extraction and assembly.
    pub total: Option<u64>,
}

/// Trait for receiving progress updates.
///
/// Implementations must be [`Send`] and [`Sync`]. Callbacks are infallible:
/// they observe but cannot halt the operation; use [`CancellationToken`] for
/// cooperative cancellation.
pub trait ProgressCallback: Send + Sync {
    /// Called after each completed unit of work.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. The default when no callback is set.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cancellation token shared between the caller and a running extraction.
///
/// Clone the token and share it between threads; calling
/// [`cancel`](CancellationToken::cancel) from any clone makes the extraction
/// loop return [`ScenebookError::Cancelled`](crate::ScenebookError::Cancelled)
/// at its next check.
///
/// # Example
///
/// ```
/// use scenebook::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. All clones observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_clones_share_state() {
        let token = CancellationToken::new();
        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
