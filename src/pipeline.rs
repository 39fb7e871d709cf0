//! The end-to-end run.
//!
//! [`Pipeline::run`] takes raw parameters to a finished document:
//!
//! ```text
//! Start → Normalized → Directed → Extracted → Curated → Assembled → Done
//! ```
//!
//! Any stage may end the run in `Failed`. Nothing is retried, and no partial
//! document is ever reported as a success. The failure names the stage and
//! keeps the tool command and raw output when there is one.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::config::PipelineConfig;
use crate::curate::FrameSet;
use crate::document::{DocumentWriter, PdfDocumentWriter, assemble};
use crate::error::Video2PdfError;
use crate::extract::{FRAME_PATTERN, FfmpegDecoder, FrameDecoder, extract_frames};
use crate::fetch::{VideoFetcher, YtDlpFetcher, fetch_video};
use crate::plan::SamplingDirective;
use crate::process::ToolCommand;
use crate::progress::StateReporter;
use crate::request::{ExtractionRequest, RawParameters};
use crate::validation::NormalizationReport;
use crate::workspace::{RunContext, RunLock};

/// The step of a run that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    /// Validating and clamping raw input.
    Normalize,
    /// Deriving the sampling directive.
    Plan,
    /// Taking the run lock and creating the run directory.
    Workspace,
    /// Downloading the source video.
    Fetch,
    /// Running the decoder.
    Extract,
    /// Listing and capping frames.
    Curate,
    /// Writing the document.
    Assemble,
}

impl PipelineStage {
    /// Lower-case stage name.
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStage::Normalize => "normalize",
            PipelineStage::Plan => "plan",
            PipelineStage::Workspace => "workspace",
            PipelineStage::Fetch => "fetch",
            PipelineStage::Extract => "extract",
            PipelineStage::Curate => "curate",
            PipelineStage::Assemble => "assemble",
        }
    }
}

impl Display for PipelineStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Where a run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    /// The run has begun.
    Start,
    /// Raw parameters became a valid request.
    Normalized,
    /// A sampling directive was derived.
    Directed,
    /// The decoder wrote at least one frame.
    Extracted,
    /// Frames were ordered and capped.
    Curated,
    /// The document was written.
    Assembled,
    /// Terminal success.
    Done,
    /// Terminal failure.
    Failed,
}

impl PipelineState {
    /// Whether no further transition can follow.
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }
}

impl Display for PipelineState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            PipelineState::Start => "start",
            PipelineState::Normalized => "normalized",
            PipelineState::Directed => "directed",
            PipelineState::Extracted => "extracted",
            PipelineState::Curated => "curated",
            PipelineState::Assembled => "assembled",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A failed run: the stage that failed and why.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {error}")]
pub struct PipelineFailure {
    stage: PipelineStage,
    #[source]
    error: Video2PdfError,
}

impl PipelineFailure {
    pub fn new(stage: PipelineStage, error: Video2PdfError) -> Self {
        Self { stage, error }
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// The underlying error.
    pub fn error(&self) -> &Video2PdfError {
        &self.error
    }

    pub fn into_error(self) -> Video2PdfError {
        self.error
    }

    /// Human-readable message, without the stage prefix.
    pub fn message(&self) -> String {
        self.error.to_string()
    }

    /// The literal command attempted, for tool failures.
    pub fn command(&self) -> Option<&str> {
        self.error.command()
    }

    /// Raw tool output, for tool failures.
    pub fn raw_output(&self) -> Option<&str> {
        self.error.raw_output()
    }

    /// Suggestion for the next attempt, for extraction failures.
    pub fn hint(&self) -> Option<&str> {
        self.error.hint()
    }
}

/// The result of a successful run.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Identifier of the run, also the run directory name.
    pub run_id: String,
    pub run_directory: PathBuf,
    /// The finished document.
    pub document_path: PathBuf,
    /// Public location of the document, when a base URL is configured.
    pub url: Option<String>,
    pub page_count: usize,
    /// Frames the decoder produced, before capping.
    pub frames_extracted: usize,
    /// Whether frames were dropped to respect the page cap.
    pub truncated: bool,
    /// Adjustments made to the raw parameters.
    pub normalization: NormalizationReport,
}

/// What a run would do, without doing it.
#[derive(Debug, Clone)]
pub struct PlanPreview {
    pub request: ExtractionRequest,
    pub normalization: NormalizationReport,
    pub directive: SamplingDirective,
    /// Decoder invocation with placeholder paths relative to a run directory.
    pub decoder_command: ToolCommand,
}

/// Sequences the stages of a run.
///
/// The fetcher, decoder, and writer are trait objects so tests and
/// embedders can replace any of them.
pub struct Pipeline {
    config: PipelineConfig,
    fetcher: Box<dyn VideoFetcher>,
    decoder: Box<dyn FrameDecoder>,
    writer: Box<dyn DocumentWriter>,
}

impl Pipeline {
    /// Pipeline with explicit collaborators.
    pub fn new(
        config: PipelineConfig,
        fetcher: impl VideoFetcher + 'static,
        decoder: impl FrameDecoder + 'static,
        writer: impl DocumentWriter + 'static,
    ) -> Self {
        Self {
            config,
            fetcher: Box::new(fetcher),
            decoder: Box::new(decoder),
            writer: Box::new(writer),
        }
    }

    /// Pipeline driving `yt-dlp` and `ffmpeg` from `config.tools`, writing PDF.
    pub fn with_default_tools(config: PipelineConfig) -> Self {
        let fetcher = YtDlpFetcher::new(&config.tools.fetcher, config.fetch_timeout);
        let decoder = FfmpegDecoder::new(&config.tools.decoder, config.decode_timeout);
        let writer = PdfDocumentWriter::new(config.document_title.as_str());
        Self::new(config, fetcher, decoder, writer)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Normalize and plan without touching the filesystem or running tools.
    pub fn plan_only(&self, raw: &RawParameters) -> Result<PlanPreview, PipelineFailure> {
        let (request, normalization) =
            ExtractionRequest::normalize(raw).map_err(at(PipelineStage::Normalize))?;
        let directive = SamplingDirective::plan(&request);
        let decoder_command = FfmpegDecoder::new(&self.config.tools.decoder, None).command(
            Path::new("video.mp4"),
            &directive,
            &PathBuf::from("frames").join(FRAME_PATTERN),
        );
        Ok(PlanPreview {
            request,
            normalization,
            directive,
            decoder_command,
        })
    }

    /// Run every stage for `raw`.
    ///
    /// Input is validated before any lock is taken or tool started, so an
    /// empty URL fails without side effects. The run lock is held from
    /// workspace creation until the document is written.
    pub fn run(&self, raw: &RawParameters) -> Result<Artifact, PipelineFailure> {
        let reporter = StateReporter::new(Arc::clone(&self.config.progress));
        reporter.enter(PipelineState::Start, None);

        let result = self.execute(raw, &reporter);
        match &result {
            Ok(artifact) => {
                log::info!("Run {} finished", artifact.run_id);
                reporter.enter(
                    PipelineState::Done,
                    Some(artifact.document_path.display().to_string()),
                );
            }
            Err(failure) => {
                log::error!("{failure}");
                reporter.enter(PipelineState::Failed, Some(failure.to_string()));
            }
        }
        result
    }

    fn execute(
        &self,
        raw: &RawParameters,
        reporter: &StateReporter,
    ) -> Result<Artifact, PipelineFailure> {
        let cancellation = self.config.cancellation.as_ref();

        let (request, normalization) =
            ExtractionRequest::normalize(raw).map_err(at(PipelineStage::Normalize))?;
        reporter.enter(
            PipelineState::Normalized,
            Some(request.source_url().to_string()),
        );

        self.checkpoint(PipelineStage::Plan)?;
        let directive = SamplingDirective::plan(&request);
        reporter.enter(
            PipelineState::Directed,
            Some(directive.filter_expression.clone()),
        );

        self.checkpoint(PipelineStage::Workspace)?;
        let _lock =
            RunLock::acquire(&self.config.workspace_root).map_err(at(PipelineStage::Workspace))?;
        let context =
            RunContext::create(&self.config.workspace_root).map_err(at(PipelineStage::Workspace))?;

        fetch_video(
            self.fetcher.as_ref(),
            request.source_url(),
            context.video_path(),
            cancellation,
        )
        .map_err(at(PipelineStage::Fetch))?;

        self.checkpoint(PipelineStage::Extract)?;
        let outcome = extract_frames(
            &context,
            &directive,
            request.mode(),
            self.decoder.as_ref(),
            cancellation,
        )
        .map_err(at(PipelineStage::Extract))?;
        reporter.enter(
            PipelineState::Extracted,
            Some(format!("{} frames", outcome.frame_count)),
        );

        self.checkpoint(PipelineStage::Curate)?;
        let frames = FrameSet::collect(context.frames_directory())
            .map_err(at(PipelineStage::Curate))?
            .capped(request.max_pages());
        reporter.enter(
            PipelineState::Curated,
            Some(format!("{} of {} frames", frames.len(), frames.found())),
        );

        self.checkpoint(PipelineStage::Assemble)?;
        let document = assemble(
            &frames,
            &self.config.page_layout,
            self.writer.as_ref(),
            context.document_path(),
        )
        .map_err(at(PipelineStage::Assemble))?;
        reporter.enter(
            PipelineState::Assembled,
            Some(format!("{} pages", document.page_count)),
        );

        if self.config.cleanup_intermediates {
            context.cleanup_intermediates();
        }

        let url = self
            .config
            .public_base_url
            .as_deref()
            .map(|base| public_url(base, context.run_id()));

        Ok(Artifact {
            run_id: context.run_id().to_string(),
            run_directory: context.run_directory().to_path_buf(),
            document_path: document.path,
            url,
            page_count: document.page_count,
            frames_extracted: outcome.frame_count,
            truncated: frames.is_truncated(),
            normalization,
        })
    }

    fn checkpoint(&self, next: PipelineStage) -> Result<(), PipelineFailure> {
        if self.config.is_cancelled() {
            return Err(PipelineFailure::new(next, Video2PdfError::Cancelled));
        }
        Ok(())
    }
}

fn at(stage: PipelineStage) -> impl FnOnce(Video2PdfError) -> PipelineFailure {
    move |error| PipelineFailure::new(stage, error)
}

fn public_url(base: &str, run_id: &str) -> String {
    format!("{}/{run_id}/output.pdf", base.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_url_joins_without_double_slash() {
        assert_eq!(
            public_url("https://files.example.com/pdf/", "ytp_20240101_120000"),
            "https://files.example.com/pdf/ytp_20240101_120000/output.pdf"
        );
        assert_eq!(
            public_url("https://files.example.com", "ytp_1"),
            "https://files.example.com/ytp_1/output.pdf"
        );
    }

    #[test]
    fn failure_display_names_stage() {
        let failure = PipelineFailure::new(
            PipelineStage::Curate,
            Video2PdfError::NoFramesFound {
                directory: PathBuf::from("frames"),
            },
        );
        assert_eq!(
            failure.to_string(),
            "curate stage failed: No frames found in frames"
        );
        assert_eq!(failure.message(), "No frames found in frames");
        assert!(failure.command().is_none());
    }
}
