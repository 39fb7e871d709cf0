//! Raw parameters and the normalized extraction request.
//!
//! [`RawParameters`] mirrors what a form or command line hands over: every
//! field is optional text. [`ExtractionRequest::normalize`] turns it into a
//! well-formed, immutable [`ExtractionRequest`]. Only an empty source URL is
//! an error; every numeric field degrades to the nearest valid value.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::error::Video2PdfError;
use crate::validation::NormalizationReport;

/// Default scene-change threshold.
pub const DEFAULT_SCENE_THRESHOLD: f64 = 0.20;
/// Lower bound of the scene-change threshold.
pub const MIN_SCENE_THRESHOLD: f64 = 0.01;
/// Upper bound of the scene-change threshold.
pub const MAX_SCENE_THRESHOLD: f64 = 1.0;
/// Default rendered frame width in pixels.
pub const DEFAULT_TARGET_WIDTH: u32 = 800;
/// Minimum rendered frame width in pixels.
pub const MIN_TARGET_WIDTH: u32 = 200;
/// Default page cap.
pub const DEFAULT_MAX_PAGES: u32 = 200;

/// How frames are sampled from the video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplingMode {
    /// Keep frames whose scene-change score exceeds a threshold.
    #[default]
    SceneDetect,
    /// Keep a fixed number of frames per second.
    FixedFps,
}

impl SamplingMode {
    /// Parse a user-supplied mode. Only `"fps"` selects
    /// [`FixedFps`](SamplingMode::FixedFps); everything else is scene detection.
    pub fn from_input(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("fps") {
            SamplingMode::FixedFps
        } else {
            SamplingMode::SceneDetect
        }
    }

    /// Short name used on the command line and in reports.
    pub fn as_str(self) -> &'static str {
        match self {
            SamplingMode::SceneDetect => "scene",
            SamplingMode::FixedFps => "fps",
        }
    }
}

impl Display for SamplingMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Unvalidated user input, one optional string per field.
///
/// # Example
///
/// ```
/// use video2pdf::RawParameters;
///
/// let raw = RawParameters::from_url("https://example.com/watch?v=abc")
///     .with_mode("fps")
///     .with_fps("2")
///     .with_start_time("30")
///     .with_end_time("90");
/// assert_eq!(raw.fps.as_deref(), Some("2"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParameters {
    /// Address of the source video.
    pub source_url: Option<String>,
    /// `"scene"` or `"fps"`.
    pub mode: Option<String>,
    /// Frames per second in FPS mode. `0` disables FPS sampling.
    pub fps: Option<String>,
    /// Scene-change threshold in scene mode.
    pub scene_threshold: Option<String>,
    /// Output frame width in pixels.
    pub width: Option<String>,
    /// Maximum number of pages in the document.
    pub max_pages: Option<String>,
    /// Start of the time window in seconds.
    pub start_time: Option<String>,
    /// End of the time window in seconds, `0` meaning the end of the video.
    pub end_time: Option<String>,
}

impl RawParameters {
    /// Parameters with only the source URL set.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            source_url: Some(url.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_mode(mut self, value: impl Into<String>) -> Self {
        self.mode = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_fps(mut self, value: impl Into<String>) -> Self {
        self.fps = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_scene_threshold(mut self, value: impl Into<String>) -> Self {
        self.scene_threshold = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_width(mut self, value: impl Into<String>) -> Self {
        self.width = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_max_pages(mut self, value: impl Into<String>) -> Self {
        self.max_pages = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_start_time(mut self, value: impl Into<String>) -> Self {
        self.start_time = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_end_time(mut self, value: impl Into<String>) -> Self {
        self.end_time = Some(value.into());
        self
    }
}

/// A validated, immutable extraction request.
///
/// Created once per submission by [`ExtractionRequest::normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    source_url: String,
    mode: SamplingMode,
    fps_cap: u32,
    scene_threshold: f64,
    target_width: u32,
    max_pages: u32,
    start_time: u64,
    end_time: u64,
}

impl ExtractionRequest {
    /// Validate and clamp raw input.
    ///
    /// Fails with [`Video2PdfError::InvalidInput`] only when the source URL is
    /// absent or blank. Every other field is clamped into range, with the
    /// adjustment recorded in the returned [`NormalizationReport`].
    pub fn normalize(
        raw: &RawParameters,
    ) -> Result<(Self, NormalizationReport), Video2PdfError> {
        let source_url = raw
            .source_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Video2PdfError::InvalidInput {
                field: "source_url",
                reason: "a video URL is required".to_string(),
            })?
            .to_string();

        let mut report = NormalizationReport::default();

        let mode = match raw.mode.as_deref() {
            Some(value) => {
                let mode = SamplingMode::from_input(value);
                let trimmed = value.trim();
                if !trimmed.eq_ignore_ascii_case("fps") && !trimmed.eq_ignore_ascii_case("scene")
                {
                    report.warn(format!(
                        "mode: unknown value \"{trimmed}\", using scene detection"
                    ));
                }
                mode
            }
            None => {
                report.note("mode: not given, using scene detection".to_string());
                SamplingMode::SceneDetect
            }
        };

        let fps_cap = integer_field(&mut report, "fps", raw.fps.as_deref(), 0, 0, u32::MAX as i64) as u32;
        let target_width = integer_field(
            &mut report,
            "width",
            raw.width.as_deref(),
            DEFAULT_TARGET_WIDTH as i64,
            MIN_TARGET_WIDTH as i64,
            u32::MAX as i64,
        ) as u32;
        let max_pages = integer_field(
            &mut report,
            "max_pages",
            raw.max_pages.as_deref(),
            DEFAULT_MAX_PAGES as i64,
            1,
            u32::MAX as i64,
        ) as u32;
        let start_time =
            integer_field(&mut report, "start_time", raw.start_time.as_deref(), 0, 0, i64::MAX) as u64;
        let end_time =
            integer_field(&mut report, "end_time", raw.end_time.as_deref(), 0, 0, i64::MAX) as u64;
        let scene_threshold = scene_threshold_field(&mut report, raw.scene_threshold.as_deref());

        if end_time > 0 && end_time <= start_time {
            report.warn(format!(
                "end_time ({end_time}s) is not after start_time ({start_time}s); decoding to the end of the video"
            ));
        }
        if mode == SamplingMode::FixedFps && fps_cap == 0 {
            report.warn("fps mode with fps 0 falls back to scene detection".to_string());
        }

        let request = Self {
            source_url,
            mode,
            fps_cap,
            scene_threshold,
            target_width,
            max_pages,
            start_time,
            end_time,
        };
        log::debug!("Normalized request: {request:?}");

        Ok((request, report))
    }

    /// Address of the source video.
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Requested sampling mode.
    pub fn mode(&self) -> SamplingMode {
        self.mode
    }

    /// Frames per second for FPS mode. `0` means FPS sampling is disabled.
    pub fn fps_cap(&self) -> u32 {
        self.fps_cap
    }

    /// Scene-change threshold, within `[0.01, 1.0]`.
    pub fn scene_threshold(&self) -> f64 {
        self.scene_threshold
    }

    /// Output frame width in pixels, at least 200.
    pub fn target_width(&self) -> u32 {
        self.target_width
    }

    /// Page cap, at least 1.
    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// Start of the time window in seconds.
    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    /// End of the time window in seconds as given; `0` means "to the end".
    pub fn end_time(&self) -> u64 {
        self.end_time
    }

    /// End of the time window if it is valid, i.e. non-zero and after the start.
    pub fn effective_end_time(&self) -> Option<u64> {
        (self.end_time > 0 && self.end_time > self.start_time).then_some(self.end_time)
    }
}

fn integer_field(
    report: &mut NormalizationReport,
    name: &str,
    raw: Option<&str>,
    default: i64,
    min: i64,
    max: i64,
) -> i64 {
    let Some(text) = raw else {
        report.note(format!("{name}: not given, using {default}"));
        return default;
    };

    match lenient_number(text) {
        Some(value) => {
            // Saturating cast; fractional input truncates toward zero.
            let whole = value.trunc() as i64;
            let clamped = whole.clamp(min, max);
            if clamped != whole || whole as f64 != value {
                report.warn(format!("{name}: \"{}\" adjusted to {clamped}", text.trim()));
            }
            clamped
        }
        None => {
            let fallback = 0_i64.clamp(min, max);
            report.warn(format!(
                "{name}: could not parse \"{}\", using {fallback}",
                text.trim()
            ));
            fallback
        }
    }
}

fn scene_threshold_field(report: &mut NormalizationReport, raw: Option<&str>) -> f64 {
    let Some(text) = raw else {
        report.note(format!("scene: not given, using {DEFAULT_SCENE_THRESHOLD}"));
        return DEFAULT_SCENE_THRESHOLD;
    };

    match lenient_number(text) {
        Some(value) => {
            let clamped = value.clamp(MIN_SCENE_THRESHOLD, MAX_SCENE_THRESHOLD);
            if clamped != value {
                report.warn(format!("scene: \"{}\" adjusted to {clamped}", text.trim()));
            }
            clamped
        }
        None => {
            report.warn(format!(
                "scene: could not parse \"{}\", using {MIN_SCENE_THRESHOLD}",
                text.trim()
            ));
            MIN_SCENE_THRESHOLD
        }
    }
}

/// Parse a number the forgiving way form input is usually treated.
///
/// The whole trimmed string is tried first, then its longest leading numeric
/// prefix (`"12px"` is 12). Non-finite values count as unparseable.
fn lenient_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .or_else(|| numeric_prefix(trimmed).parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

fn numeric_prefix(text: &str) -> &str {
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let integer_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let has_integer_digits = end > integer_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let mut fraction_end = end + 1;
        while fraction_end < bytes.len() && bytes[fraction_end].is_ascii_digit() {
            fraction_end += 1;
        }
        if has_integer_digits || fraction_end > end + 1 {
            end = fraction_end;
        }
    }

    &text[..end]
}
