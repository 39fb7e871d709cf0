//! Error types for the `video2pdf` crate.
//!
//! This module defines [`Video2PdfError`], the unified error type returned by
//! every fallible operation in the crate. Errors carry the context needed to
//! diagnose a failed run without re-running it: the literal command that was
//! attempted, the raw tool output, and paths involved.

use std::{io::Error as IoError, path::PathBuf, time::Duration};

use image::ImageError;
use thiserror::Error;

/// The unified error type for all `video2pdf` operations.
///
/// Every public function that can fail returns `Result<T, Video2PdfError>`.
/// The pipeline wraps these in a [`PipelineFailure`](crate::PipelineFailure)
/// that also names the stage that failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Video2PdfError {
    /// A required input field was missing or empty.
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput {
        /// Name of the offending field.
        field: &'static str,
        /// Why the field was rejected.
        reason: String,
    },

    /// The video fetcher exited unsuccessfully or left no file behind.
    #[error("Video download failed (exit code {})", display_exit_code(.exit_code))]
    FetchFailed {
        /// Process exit code. `None` when the process was killed by a signal.
        exit_code: Option<i32>,
        /// The rendered command line that was attempted.
        command: String,
        /// Raw combined stdout/stderr of the fetcher.
        output: String,
    },

    /// The frame decoder failed or produced no frames.
    ///
    /// A zero exit code with zero frames written is reported through this
    /// variant too.
    #[error("FFmpeg failed to extract frames (exit code {})", display_exit_code(.exit_code))]
    ExtractionFailed {
        /// Process exit code. `None` when the process was killed by a signal.
        exit_code: Option<i32>,
        /// The rendered command line that was attempted.
        command: String,
        /// Raw combined stdout/stderr of the decoder.
        output: String,
        /// Mode-specific suggestion for the next attempt.
        hint: String,
    },

    /// No frame images matching the expected naming pattern were found.
    #[error("No frames found in {}", .directory.display())]
    NoFramesFound {
        /// The directory that was listed.
        directory: PathBuf,
    },

    /// The document could not be assembled or persisted.
    #[error("Failed to assemble document: {reason}")]
    AssemblyFailed {
        /// Underlying reason.
        reason: String,
    },

    /// An external tool could not be started at all.
    #[error("Failed to start {tool}: {reason}")]
    ToolUnavailable {
        /// Program that was being launched.
        tool: String,
        /// Underlying reason the spawn failed.
        reason: String,
        /// The command line that was attempted.
        command: String,
    },

    /// An external tool ran past its deadline and was killed.
    #[error("{tool} did not finish within {timeout:?} and was killed")]
    ToolTimeout {
        /// Program that timed out.
        tool: String,
        /// The deadline that was exceeded.
        timeout: Duration,
        /// The rendered command line.
        command: String,
        /// Output captured before the process was killed.
        output: String,
    },

    /// The run was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// Another run currently holds the workspace lock.
    #[error("Workspace is in use by another run (lock held on {})", .path.display())]
    WorkspaceLocked {
        /// Path of the lock file.
        path: PathBuf,
    },

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// A frame image could not be read or decoded.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl Video2PdfError {
    /// The literal command line associated with this error, if any.
    pub fn command(&self) -> Option<&str> {
        match self {
            Video2PdfError::FetchFailed { command, .. }
            | Video2PdfError::ExtractionFailed { command, .. }
            | Video2PdfError::ToolUnavailable { command, .. }
            | Video2PdfError::ToolTimeout { command, .. } => Some(command),
            _ => None,
        }
    }

    /// Raw tool output associated with this error, if any.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            Video2PdfError::FetchFailed { output, .. }
            | Video2PdfError::ExtractionFailed { output, .. }
            | Video2PdfError::ToolTimeout { output, .. } => Some(output),
            _ => None,
        }
    }

    /// A suggestion for the next attempt, if one applies.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Video2PdfError::ExtractionFailed { hint, .. } => Some(hint),
            _ => None,
        }
    }
}

fn display_exit_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}
