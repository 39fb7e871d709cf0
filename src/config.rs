//! Pipeline configuration.
//!
//! [`PipelineConfig`] is a builder holding everything about a run that is
//! not user input: where runs live, which tools to use, how long they may
//! take, page layout, and the progress and cancellation hooks.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use video2pdf::{PipelineConfig, ToolPaths};
//!
//! let config = PipelineConfig::new()
//!     .with_workspace_root("/srv/video2pdf")
//!     .with_tools(ToolPaths::resolve(None))
//!     .with_decode_timeout(Duration::from_secs(600))
//!     .with_public_base_url("https://files.example.com/video2pdf");
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::document::PageLayout;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};
use crate::tools::ToolPaths;

/// Default directory holding run directories and the lock file.
pub const DEFAULT_WORKSPACE_ROOT: &str = "video2pdf-work";
/// Default limit on a single fetcher run.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10 * 60);
/// Default limit on a single decoder run.
pub const DEFAULT_DECODE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
/// Default document title.
pub const DEFAULT_DOCUMENT_TITLE: &str = "Video frames";

/// Operational settings for a [`Pipeline`](crate::Pipeline).
///
/// All fields have working defaults; `PipelineConfig::new()` runs with tools
/// looked up by bare name, in `./video2pdf-work`.
#[derive(Clone)]
pub struct PipelineConfig {
    pub(crate) workspace_root: PathBuf,
    pub(crate) tools: ToolPaths,
    /// `None` disables the limit.
    pub(crate) fetch_timeout: Option<Duration>,
    pub(crate) decode_timeout: Option<Duration>,
    pub(crate) page_layout: PageLayout,
    pub(crate) document_title: String,
    pub(crate) public_base_url: Option<String>,
    pub(crate) cleanup_intermediates: bool,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
}

impl Debug for PipelineConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PipelineConfig")
            .field("workspace_root", &self.workspace_root)
            .field("tools", &self.tools)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("decode_timeout", &self.decode_timeout)
            .field("page_layout", &self.page_layout)
            .field("document_title", &self.document_title)
            .field("public_base_url", &self.public_base_url)
            .field("cleanup_intermediates", &self.cleanup_intermediates)
            .field("has_cancellation", &self.cancellation.is_some())
            .finish()
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self {
            workspace_root: PathBuf::from(DEFAULT_WORKSPACE_ROOT),
            tools: ToolPaths::default(),
            fetch_timeout: Some(DEFAULT_FETCH_TIMEOUT),
            decode_timeout: Some(DEFAULT_DECODE_TIMEOUT),
            page_layout: PageLayout::default(),
            document_title: DEFAULT_DOCUMENT_TITLE.to_string(),
            public_base_url: None,
            cleanup_intermediates: false,
            progress: Arc::new(NoOpProgress),
            cancellation: None,
        }
    }

    /// Directory that holds run directories and the run lock.
    #[must_use]
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = root.into();
        self
    }

    /// Fetcher and decoder executables.
    #[must_use]
    pub fn with_tools(mut self, tools: ToolPaths) -> Self {
        self.tools = tools;
        self
    }

    /// Limit on the fetcher. `None` waits indefinitely.
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: impl Into<Option<Duration>>) -> Self {
        self.fetch_timeout = timeout.into();
        self
    }

    /// Limit on the decoder. `None` waits indefinitely.
    #[must_use]
    pub fn with_decode_timeout(mut self, timeout: impl Into<Option<Duration>>) -> Self {
        self.decode_timeout = timeout.into();
        self
    }

    #[must_use]
    pub fn with_page_layout(mut self, layout: PageLayout) -> Self {
        self.page_layout = layout;
        self
    }

    /// Title written into the document information.
    #[must_use]
    pub fn with_document_title(mut self, title: impl Into<String>) -> Self {
        self.document_title = title.into();
        self
    }

    /// Base URL under which run directories are served.
    ///
    /// When set, artifacts carry `<base>/<run_id>/output.pdf`.
    #[must_use]
    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = Some(url.into());
        self
    }

    /// Delete the video and frames after a successful run.
    #[must_use]
    pub fn with_cleanup_intermediates(mut self, cleanup: bool) -> Self {
        self.cleanup_intermediates = cleanup;
        self
    }

    /// Attach a progress callback, invoked on every state transition.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled, the run stops at the next stage boundary
    /// or kills the running tool, and fails with
    /// [`Video2PdfError::Cancelled`](crate::Video2PdfError::Cancelled).
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// The workspace root.
    pub fn workspace_root(&self) -> &std::path::Path {
        &self.workspace_root
    }

    /// The configured tools.
    pub fn tools(&self) -> &ToolPaths {
        &self.tools
    }

    /// Returns `true` if cancellation has been requested.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
