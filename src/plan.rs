//! Sampling plan.
//!
//! [`SamplingDirective::plan`] is a pure function from an
//! [`ExtractionRequest`] to the filter expression and time window the decoder
//! understands. Seek and duration are kept as separate fields so the decoder
//! can place them before the input is opened, which trims without decoding
//! the skipped part.
//!
//! # Example
//!
//! ```
//! use video2pdf::{ExtractionRequest, RawParameters, SamplingDirective};
//!
//! let raw = RawParameters::from_url("https://example.com/v")
//!     .with_mode("fps")
//!     .with_fps("1")
//!     .with_start_time("10")
//!     .with_end_time("40");
//! let (request, _) = ExtractionRequest::normalize(&raw)?;
//! let directive = SamplingDirective::plan(&request);
//!
//! assert_eq!(directive.filter_expression, "fps=1,scale=800:-1:flags=lanczos");
//! assert_eq!(directive.seek_seconds, 10);
//! assert_eq!(directive.duration_seconds, 30);
//! # Ok::<(), video2pdf::Video2PdfError>(())
//! ```

use crate::request::{ExtractionRequest, SamplingMode};

/// Decoder instructions derived from a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplingDirective {
    /// FFmpeg video filter chain: either FPS sampling or scene selection,
    /// followed by a Lanczos scale to the target width.
    pub filter_expression: String,
    /// Seconds to seek before decoding. `0` means start at the beginning.
    pub seek_seconds: u64,
    /// Seconds to decode after the seek point. `0` means until the end.
    pub duration_seconds: u64,
    /// The mode the filter actually implements.
    ///
    /// FPS mode with an FPS of zero is planned as scene detection.
    pub effective_mode: SamplingMode,
}

impl SamplingDirective {
    /// Derive the directive for `request`.
    ///
    /// Deterministic: the same request always yields the same directive.
    pub fn plan(request: &ExtractionRequest) -> Self {
        let scale = scale_filter(request.target_width());

        let (effective_mode, sampler) =
            if request.mode() == SamplingMode::FixedFps && request.fps_cap() > 0 {
                (SamplingMode::FixedFps, fps_filter(request.fps_cap()))
            } else {
                (
                    SamplingMode::SceneDetect,
                    scene_filter(request.scene_threshold()),
                )
            };

        let seek_seconds = request.start_time();
        let duration_seconds = request
            .effective_end_time()
            .map(|end| end - request.start_time())
            .unwrap_or(0);

        let directive = Self {
            filter_expression: format!("{sampler},{scale}"),
            seek_seconds,
            duration_seconds,
            effective_mode,
        };
        log::debug!("Planned directive: {directive:?}");
        directive
    }

    /// Whether decoding starts somewhere other than the beginning.
    pub fn has_seek(&self) -> bool {
        self.seek_seconds > 0
    }

    /// Whether decoding stops before the end of the stream.
    pub fn is_bounded(&self) -> bool {
        self.duration_seconds > 0
    }
}

fn fps_filter(fps: u32) -> String {
    format!("fps={fps}")
}

fn scene_filter(threshold: f64) -> String {
    format!("select='gt(scene,{threshold})'")
}

fn scale_filter(width: u32) -> String {
    format!("scale={width}:-1:flags=lanczos")
}
