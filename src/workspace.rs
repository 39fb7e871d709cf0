//! Per-run workspace and the run lock.
//!
//! Every run gets its own directory under the workspace root, named after
//! the time it started. Runs are additionally serialized by an exclusive
//! lock on a file in the root, so two processes sharing an installation can
//! never interleave.

use std::fs::{self, File, OpenOptions, TryLockError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::Video2PdfError;

/// Name of the lock file inside the workspace root.
pub const LOCK_FILE_NAME: &str = ".video2pdf.lock";

const RUN_PREFIX: &str = "ytp_";
const VIDEO_FILE_NAME: &str = "video.mp4";
const FRAMES_DIR_NAME: &str = "frames";
const DEBUG_LOG_NAME: &str = "ffmpeg_cmd.txt";
const DOCUMENT_NAME: &str = "output.pdf";

/// Exclusive hold on a workspace root.
///
/// The lock is advisory and released when this value is dropped or the
/// process exits.
#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    /// Take the lock on `root`, creating the directory if needed.
    ///
    /// Does not wait: a lock held elsewhere fails immediately with
    /// [`Video2PdfError::WorkspaceLocked`].
    pub fn acquire(root: &Path) -> Result<Self, Video2PdfError> {
        fs::create_dir_all(root)?;
        let path = root.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;

        match file.try_lock() {
            Ok(()) => {
                log::debug!("Acquired run lock {}", path.display());
                Ok(Self { file, path })
            }
            Err(TryLockError::WouldBlock) => Err(Video2PdfError::WorkspaceLocked { path }),
            Err(TryLockError::Error(error)) => Err(error.into()),
        }
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(error) = self.file.unlock() {
            log::debug!("Unlocking {} failed: {error}", self.path.display());
        }
    }
}

/// Paths belonging to one pipeline run.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// use video2pdf::RunContext;
///
/// let context = RunContext::create(Path::new("video2pdf-work"))?;
/// println!("run {} in {}", context.run_id(), context.run_directory().display());
/// # Ok::<(), video2pdf::Video2PdfError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    run_id: String,
    run_directory: PathBuf,
    video_path: PathBuf,
    frames_directory: PathBuf,
    debug_log_path: PathBuf,
    document_path: PathBuf,
}

impl RunContext {
    /// Create a fresh run directory under `root`.
    ///
    /// The directory is named `ytp_<YYYYmmdd_HHMMSS>`; a second run within
    /// the same second gets a `_2`, `_3`, … suffix.
    pub fn create(root: &Path) -> Result<Self, Video2PdfError> {
        fs::create_dir_all(root)?;
        let stamp = format!("{RUN_PREFIX}{}", Local::now().format("%Y%m%d_%H%M%S"));

        let mut attempt = 1_u32;
        loop {
            let run_id = if attempt == 1 {
                stamp.clone()
            } else {
                format!("{stamp}_{attempt}")
            };
            let run_directory = root.join(&run_id);
            match fs::create_dir(&run_directory) {
                Ok(()) => {
                    log::info!("Run directory {}", run_directory.display());
                    return Ok(Self::at(run_id, run_directory));
                }
                Err(error) if error.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(error) => return Err(error.into()),
            }
        }
    }

    fn at(run_id: String, run_directory: PathBuf) -> Self {
        Self {
            video_path: run_directory.join(VIDEO_FILE_NAME),
            frames_directory: run_directory.join(FRAMES_DIR_NAME),
            debug_log_path: run_directory.join(DEBUG_LOG_NAME),
            document_path: run_directory.join(DOCUMENT_NAME),
            run_id,
            run_directory,
        }
    }

    /// Name of the run directory, used as the run identifier.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Directory holding every file of this run.
    pub fn run_directory(&self) -> &Path {
        &self.run_directory
    }

    /// Where the fetched video is stored.
    pub fn video_path(&self) -> &Path {
        &self.video_path
    }

    /// Where extracted frames are written.
    pub fn frames_directory(&self) -> &Path {
        &self.frames_directory
    }

    /// The extraction debug log: command line, blank line, raw output.
    pub fn debug_log_path(&self) -> &Path {
        &self.debug_log_path
    }

    /// Where the finished document is placed.
    pub fn document_path(&self) -> &Path {
        &self.document_path
    }

    /// Delete the downloaded video and the frames directory.
    ///
    /// Failures are logged and otherwise ignored; the document and debug log
    /// are kept.
    pub fn cleanup_intermediates(&self) {
        if let Err(error) = fs::remove_file(&self.video_path)
            && error.kind() != ErrorKind::NotFound
        {
            log::warn!("Could not remove {}: {error}", self.video_path.display());
        }
        if let Err(error) = fs::remove_dir_all(&self.frames_directory)
            && error.kind() != ErrorKind::NotFound
        {
            log::warn!(
                "Could not remove {}: {error}",
                self.frames_directory.display()
            );
        }
    }
}
