//! Progress reporting and cancellation support.
//!
//! This module provides [`ProgressCallback`] for observing a pipeline run as it
//! moves through its states, [`CancellationToken`] for cooperative
//! cancellation, and [`ProgressInfo`] for the snapshot handed to callbacks.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use video2pdf::{
//!     CancellationToken, Pipeline, PipelineConfig, ProgressCallback, ProgressInfo,
//!     RawParameters,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("[{:?}] after {:.1}s", info.state, info.elapsed.as_secs_f32());
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let config = PipelineConfig::new()
//!     .with_progress(Arc::new(PrintProgress))
//!     .with_cancellation(token.clone());
//!
//! let pipeline = Pipeline::with_default_tools(config);
//! let artifact = pipeline.run(&RawParameters::from_url("https://example.com/watch?v=abc"));
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

use crate::pipeline::PipelineState;

/// A snapshot of pipeline progress.
///
/// Delivered to [`ProgressCallback::on_progress`] on every state transition.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// The state the run just entered.
    pub state: PipelineState,
    /// Wall-clock time elapsed since the run started.
    pub elapsed: Duration,
    /// Short human-readable detail about the transition, such as a frame count.
    pub detail: Option<String>,
}

/// Trait for receiving progress updates during a pipeline run.
///
/// Implementations must be [`Send`] and [`Sync`] so a single callback can be
/// shared between runs on different threads.
///
/// Progress callbacks are **infallible**: they observe but cannot halt the
/// run. Use [`CancellationToken`] for cooperative cancellation.
pub trait ProgressCallback: Send + Sync {
    /// Called once per state transition.
    fn on_progress(&self, info: &ProgressInfo);
}

/// A no-op implementation that discards all progress notifications.
///
/// This is the default when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone this token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from any thread to stop the
/// associated run. The pipeline checks the token between stages, and the
/// process runner checks it while waiting on an external tool, killing the
/// tool when cancellation is observed.
///
/// # Example
///
/// ```
/// use video2pdf::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation.
    ///
    /// All clones of this token will observe the cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Emits one [`ProgressInfo`] per state transition, timed from creation.
pub(crate) struct StateReporter {
    callback: Arc<dyn ProgressCallback>,
    start_time: Instant,
}

impl StateReporter {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>) -> Self {
        Self {
            callback,
            start_time: Instant::now(),
        }
    }

    pub(crate) fn enter(&self, state: PipelineState, detail: Option<String>) {
        let info = ProgressInfo {
            state,
            elapsed: self.start_time.elapsed(),
            detail,
        };
        self.callback.on_progress(&info);
    }
}
