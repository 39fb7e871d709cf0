//! # video2pdf
//!
//! Turn a video URL into a PDF with one sampled still frame per page.
//!
//! `video2pdf` downloads a video with `yt-dlp`, samples frames with `ffmpeg`
//! (at a fixed rate or on scene changes, optionally inside a time window),
//! orders and caps them, and lays them out one per A4 page with
//! [`lopdf`](https://crates.io/crates/lopdf).
//!
//! ## Quick Start
//!
//! ### Convert a Video
//!
//! ```no_run
//! use video2pdf::{Pipeline, PipelineConfig, RawParameters, ToolPaths};
//!
//! let config = PipelineConfig::new().with_tools(ToolPaths::resolve(None));
//! let pipeline = Pipeline::with_default_tools(config);
//!
//! let raw = RawParameters::from_url("https://www.youtube.com/watch?v=abc")
//!     .with_mode("scene")
//!     .with_scene_threshold("0.15")
//!     .with_max_pages("40");
//!
//! match pipeline.run(&raw) {
//!     Ok(artifact) => println!("{} pages in {}", artifact.page_count, artifact.document_path.display()),
//!     Err(failure) => eprintln!("{failure}"),
//! }
//! ```
//!
//! ### Preview the Decoder Command
//!
//! ```
//! use video2pdf::{Pipeline, PipelineConfig, RawParameters};
//!
//! let pipeline = Pipeline::with_default_tools(PipelineConfig::new());
//! let raw = RawParameters::from_url("https://example.com/v")
//!     .with_mode("fps")
//!     .with_fps("1")
//!     .with_start_time("10")
//!     .with_end_time("5");
//! let preview = pipeline.plan_only(&raw)?;
//!
//! // An end before the start means "to the end of the video".
//! assert_eq!(preview.directive.duration_seconds, 0);
//! # Ok::<(), video2pdf::PipelineFailure>(())
//! ```
//!
//! ## Features
//!
//! - **Lenient input**: numeric parameters are clamped, never rejected, with
//!   every adjustment listed in a [`NormalizationReport`]
//! - **Two sampling modes**: fixed FPS or scene-change detection
//! - **Fast trimming**: seek and duration are applied before the input is
//!   opened
//! - **Natural ordering**: `frame_10000.jpg` sorts after `frame_9999.jpg`
//! - **Atomic output**: the PDF appears only once it is complete
//! - **Diagnostics**: failures carry the stage, the exact tool command, its
//!   raw output, and a hint
//! - **Isolation**: one directory per run and an exclusive run lock
//! - **Timeouts & cancellation**: external tools are killed on deadline or
//!   on [`CancellationToken::cancel`]
//!
//! ## Requirements
//!
//! `yt-dlp` and `ffmpeg` must be installed, either on `PATH` or in a bundled
//! tools directory passed to [`ToolPaths::resolve`].

pub mod config;
pub mod curate;
pub mod document;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod plan;
pub mod process;
pub mod progress;
pub mod request;
pub mod tools;
pub mod validation;
pub mod workspace;

pub use config::PipelineConfig;
pub use curate::{FrameSet, is_frame_name, natural_cmp};
pub use document::{
    Document, DocumentWriter, PageLayout, PdfDocumentWriter, Placement, assemble,
};
pub use error::Video2PdfError;
pub use extract::{
    ExtractionOutcome, FRAME_PATTERN, FfmpegDecoder, FrameDecoder, extract_frames,
    extraction_hint,
};
pub use fetch::{VideoFetcher, YtDlpFetcher, fetch_video};
pub use pipeline::{
    Artifact, Pipeline, PipelineFailure, PipelineStage, PipelineState, PlanPreview,
};
pub use plan::SamplingDirective;
pub use process::{ToolCommand, ToolOutput};
pub use progress::{CancellationToken, ProgressCallback, ProgressInfo};
pub use request::{ExtractionRequest, RawParameters, SamplingMode};
pub use tools::ToolPaths;
pub use validation::NormalizationReport;
pub use workspace::{RunContext, RunLock};
