//! Retrieval of the source video.
//!
//! The fetcher is an external collaborator. [`VideoFetcher`] is the seam: the
//! default [`YtDlpFetcher`] drives `yt-dlp`, and tests substitute their own
//! implementation. [`fetch_video`] applies the success rule shared by every
//! fetcher: a zero exit status **and** a file at the destination.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Video2PdfError;
use crate::process::{ToolCommand, ToolOutput};
use crate::progress::CancellationToken;

/// Something that can download a video to a local file.
pub trait VideoFetcher: Send + Sync {
    /// Download `url` to `destination`.
    ///
    /// Implementations report the tool's exit status and output as a
    /// [`ToolOutput`] and leave classification to [`fetch_video`]. Errors are
    /// for failures to run at all (spawn failure, timeout, cancellation).
    fn fetch(
        &self,
        url: &str,
        destination: &Path,
        cancellation: Option<&CancellationToken>,
    ) -> Result<ToolOutput, Video2PdfError>;
}

/// [`VideoFetcher`] backed by the `yt-dlp` executable.
#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl YtDlpFetcher {
    /// Fetcher running `program`, killed after `timeout` if one is given.
    pub fn new(program: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// The command that downloads `url` to `destination` as MP4.
    pub fn command(&self, url: &str, destination: &Path) -> ToolCommand {
        ToolCommand::new(&self.program)
            .args(["-f", "mp4", "-o"])
            .arg(destination)
            .arg("--")
            .arg(url)
    }
}

impl VideoFetcher for YtDlpFetcher {
    fn fetch(
        &self,
        url: &str,
        destination: &Path,
        cancellation: Option<&CancellationToken>,
    ) -> Result<ToolOutput, Video2PdfError> {
        self.command(url, destination).run(self.timeout, cancellation)
    }
}

/// Download `url` to `destination` and verify the result.
///
/// # Errors
///
/// Returns [`Video2PdfError::FetchFailed`] when the fetcher exits non-zero or
/// exits cleanly without writing `destination`, and passes through the
/// fetcher's own errors unchanged.
pub fn fetch_video(
    fetcher: &dyn VideoFetcher,
    url: &str,
    destination: &Path,
    cancellation: Option<&CancellationToken>,
) -> Result<(), Video2PdfError> {
    log::info!("Fetching {url}");
    let result = fetcher.fetch(url, destination, cancellation)?;

    if result.success() && destination.is_file() {
        log::info!("Video saved to {}", destination.display());
        return Ok(());
    }

    if result.success() {
        log::warn!(
            "Fetcher exited cleanly but {} does not exist",
            destination.display()
        );
    }
    Err(Video2PdfError::FetchFailed {
        exit_code: result.exit_code,
        command: result.command,
        output: result.output,
    })
}
