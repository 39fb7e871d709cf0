//! Discovery of the external programs the pipeline drives.
//!
//! Resolution happens once, at startup: a copy bundled next to the
//! application wins, then whatever is on `PATH`, and finally the bare program
//! name so the spawn error names the missing tool.

use std::path::{Path, PathBuf};

/// Default program name of the video fetcher.
pub const FETCHER_PROGRAM: &str = "yt-dlp";
/// Default program name of the frame decoder.
pub const DECODER_PROGRAM: &str = "ffmpeg";

/// Resolved locations of the fetcher and decoder executables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    /// Path of the video fetcher (`yt-dlp`).
    pub fetcher: PathBuf,
    /// Path of the frame decoder (`ffmpeg`).
    pub decoder: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            fetcher: PathBuf::from(FETCHER_PROGRAM),
            decoder: PathBuf::from(DECODER_PROGRAM),
        }
    }
}

impl ToolPaths {
    /// Resolve both tools, preferring copies inside `bundled_dir`.
    pub fn resolve(bundled_dir: Option<&Path>) -> Self {
        let paths = Self {
            fetcher: resolve_program(bundled_dir, FETCHER_PROGRAM),
            decoder: resolve_program(bundled_dir, DECODER_PROGRAM),
        };
        log::info!(
            "Using fetcher {} and decoder {}",
            paths.fetcher.display(),
            paths.decoder.display()
        );
        paths
    }

    /// Replace the fetcher path.
    #[must_use]
    pub fn with_fetcher(mut self, path: impl Into<PathBuf>) -> Self {
        self.fetcher = path.into();
        self
    }

    /// Replace the decoder path.
    #[must_use]
    pub fn with_decoder(mut self, path: impl Into<PathBuf>) -> Self {
        self.decoder = path.into();
        self
    }
}

fn resolve_program(bundled_dir: Option<&Path>, program: &str) -> PathBuf {
    if let Some(bundled) = bundled_dir.and_then(|dir| bundled_candidate(dir, program)) {
        log::debug!("Found bundled {program} at {}", bundled.display());
        return bundled;
    }

    match which::which(program) {
        Ok(found) => found,
        Err(error) => {
            log::warn!("{program} not found on PATH ({error}); will try the bare name");
            PathBuf::from(program)
        }
    }
}

fn bundled_candidate(dir: &Path, program: &str) -> Option<PathBuf> {
    let plain = dir.join(program);
    let executable = dir.join(format!("{program}{}", std::env::consts::EXE_SUFFIX));
    [executable, plain].into_iter().find(|path| path.is_file())
}
