//! Frame extraction.
//!
//! [`extract_frames`] resets the run's frames directory, hands the
//! [`SamplingDirective`] to a [`FrameDecoder`], records the exact invocation
//! and raw output to the run's debug log, and classifies the result. A clean
//! exit that produced no frames is a failure, not an empty success.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::curate::list_frames;
use crate::error::Video2PdfError;
use crate::plan::SamplingDirective;
use crate::process::{ToolCommand, ToolOutput};
use crate::progress::CancellationToken;
use crate::request::SamplingMode;
use crate::workspace::RunContext;

/// Output file pattern handed to the decoder, relative to the frames directory.
pub const FRAME_PATTERN: &str = "frame_%04d.jpg";

const SCENE_HINT: &str = "Try lowering the scene threshold (e.g., 0.10 or 0.05).";
const FPS_HINT: &str = "Try increasing FPS.";

/// Something that can turn a video into numbered still images.
pub trait FrameDecoder: Send + Sync {
    /// Decode `video` according to `directive`, writing images named after
    /// `output_pattern` (a `%04d`-style pattern).
    ///
    /// A non-zero exit is reported in the returned [`ToolOutput`], not as an
    /// error.
    fn decode(
        &self,
        video: &Path,
        directive: &SamplingDirective,
        output_pattern: &Path,
        cancellation: Option<&CancellationToken>,
    ) -> Result<ToolOutput, Video2PdfError>;
}

/// [`FrameDecoder`] backed by the `ffmpeg` executable.
#[derive(Debug, Clone)]
pub struct FfmpegDecoder {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl FfmpegDecoder {
    /// Decoder running `program`, killed after `timeout` if one is given.
    pub fn new(program: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Build the decoder invocation.
    ///
    /// Seek and duration go before `-i` so the decoder skips to the window
    /// without decoding what precedes it.
    ///
    /// # Example
    ///
    /// ```
    /// use std::path::Path;
    ///
    /// use video2pdf::{ExtractionRequest, FfmpegDecoder, RawParameters, SamplingDirective};
    ///
    /// let raw = RawParameters::from_url("https://example.com/v")
    ///     .with_mode("fps")
    ///     .with_fps("2")
    ///     .with_start_time("5");
    /// let (request, _) = ExtractionRequest::normalize(&raw)?;
    /// let directive = SamplingDirective::plan(&request);
    ///
    /// let command = FfmpegDecoder::new("ffmpeg", None).command(
    ///     Path::new("video.mp4"),
    ///     &directive,
    ///     Path::new("frames/frame_%04d.jpg"),
    /// );
    /// assert_eq!(
    ///     command.render(),
    ///     "ffmpeg -ss 5 -i video.mp4 -vf fps=2,scale=800:-1:flags=lanczos \
    ///      -vsync vfr -y frames/frame_%04d.jpg -hide_banner -loglevel error"
    /// );
    /// # Ok::<(), video2pdf::Video2PdfError>(())
    /// ```
    pub fn command(
        &self,
        video: &Path,
        directive: &SamplingDirective,
        output_pattern: &Path,
    ) -> ToolCommand {
        let mut command = ToolCommand::new(&self.program);
        if directive.has_seek() {
            command = command.arg("-ss").arg(directive.seek_seconds.to_string());
        }
        if directive.is_bounded() {
            command = command.arg("-t").arg(directive.duration_seconds.to_string());
        }
        command
            .arg("-i")
            .arg(video)
            .arg("-vf")
            .arg(&directive.filter_expression)
            .args(["-vsync", "vfr", "-y"])
            .arg(output_pattern)
            .args(["-hide_banner", "-loglevel", "error"])
    }
}

impl FrameDecoder for FfmpegDecoder {
    fn decode(
        &self,
        video: &Path,
        directive: &SamplingDirective,
        output_pattern: &Path,
        cancellation: Option<&CancellationToken>,
    ) -> Result<ToolOutput, Video2PdfError> {
        self.command(video, directive, output_pattern)
            .run(self.timeout, cancellation)
    }
}

/// A successful extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionOutcome {
    /// Number of frame files written.
    pub frame_count: usize,
    /// Rendered decoder command line.
    pub command: String,
    /// Raw decoder output.
    pub output: String,
}

/// The suggestion attached to a failed extraction for `mode`.
pub fn extraction_hint(mode: SamplingMode) -> &'static str {
    match mode {
        SamplingMode::SceneDetect => SCENE_HINT,
        SamplingMode::FixedFps => FPS_HINT,
    }
}

/// Run the decoder for one pipeline run.
///
/// The frames directory of `context` is emptied first (and created if
/// missing), so the outcome reflects this invocation alone. `requested_mode`
/// selects the hint attached to a failure.
///
/// # Errors
///
/// Returns [`Video2PdfError::ExtractionFailed`] when the decoder exits
/// non-zero or writes no frames. Timeouts, cancellation, and spawn failures
/// pass through unchanged; the debug log is still written when the error
/// carries a command, with empty output when the tool never ran.
pub fn extract_frames(
    context: &RunContext,
    directive: &SamplingDirective,
    requested_mode: SamplingMode,
    decoder: &dyn FrameDecoder,
    cancellation: Option<&CancellationToken>,
) -> Result<ExtractionOutcome, Video2PdfError> {
    let frames_directory = context.frames_directory();
    reset_directory(frames_directory)?;

    let pattern = frames_directory.join(FRAME_PATTERN);
    let result = decoder.decode(context.video_path(), directive, &pattern, cancellation);

    let output = match result {
        Ok(output) => output,
        Err(error) => {
            if let Some(command) = error.command() {
                write_debug_log(
                    context.debug_log_path(),
                    command,
                    error.raw_output().unwrap_or_default(),
                );
            }
            return Err(error);
        }
    };
    write_debug_log(context.debug_log_path(), &output.command, &output.output);

    let frame_count = list_frames(frames_directory)?.len();
    log::info!(
        "Decoder exited with {:?}, {frame_count} frames written",
        output.exit_code
    );

    if !output.success() || frame_count == 0 {
        return Err(Video2PdfError::ExtractionFailed {
            exit_code: output.exit_code,
            command: output.command,
            output: output.output,
            hint: extraction_hint(requested_mode).to_string(),
        });
    }

    Ok(ExtractionOutcome {
        frame_count,
        command: output.command,
        output: output.output,
    })
}

/// Remove everything inside `directory`, creating it if needed.
fn reset_directory(directory: &Path) -> Result<(), Video2PdfError> {
    fs::create_dir_all(directory)?;
    let mut removed = 0_usize;
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
        removed += 1;
    }
    if removed > 0 {
        log::debug!("Cleared {removed} stale entries from {}", directory.display());
    }
    Ok(())
}

/// Best effort: a debug log that cannot be written must not fail the run.
fn write_debug_log(path: &Path, command: &str, output: &str) {
    let contents = format!("{command}\n\n{output}");
    if let Err(error) = fs::write(path, contents) {
        log::warn!("Could not write {}: {error}", path.display());
    }
}
