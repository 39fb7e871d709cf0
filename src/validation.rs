//! Normalization report.
//!
//! [`ExtractionRequest::normalize`](crate::ExtractionRequest::normalize) never
//! rejects a numeric field; it clamps or substitutes a default instead. Every
//! such adjustment is recorded in a [`NormalizationReport`] so the caller can
//! show the user what was actually used.
//!
//! # Example
//!
//! ```
//! use video2pdf::{ExtractionRequest, RawParameters};
//!
//! let raw = RawParameters::from_url("https://example.com/v")
//!     .with_width("50")
//!     .with_max_pages("zero");
//! let (request, report) = ExtractionRequest::normalize(&raw)?;
//!
//! assert_eq!(request.target_width(), 200);
//! assert_eq!(request.max_pages(), 1);
//! assert_eq!(report.warnings.len(), 2);
//! # Ok::<(), video2pdf::Video2PdfError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Summary of the adjustments made while normalizing raw parameters.
///
/// `info` lists defaults applied to absent fields; `warnings` lists values
/// that were malformed, clamped, or otherwise reinterpreted.
#[derive(Debug, Clone, Default)]
pub struct NormalizationReport {
    /// Defaults substituted for absent fields (not problems).
    pub info: Vec<String>,
    /// Input that was malformed or out of range and has been adjusted.
    pub warnings: Vec<String>,
}

impl NormalizationReport {
    /// Returns `true` if every supplied value was used exactly as given.
    ///
    /// Defaults for absent fields do not count as adjustments.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Total number of entries (info + warnings).
    pub fn entry_count(&self) -> usize {
        self.info.len() + self.warnings.len()
    }

    pub(crate) fn note(&mut self, message: String) {
        self.info.push(message);
    }

    pub(crate) fn warn(&mut self, message: String) {
        log::warn!("{message}");
        self.warnings.push(message);
    }
}

impl Display for NormalizationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for item in &self.info {
            writeln!(f, "[INFO] {item}")?;
        }
        for item in &self.warnings {
            writeln!(f, "[WARN] {item}")?;
        }
        if self.entry_count() == 0 {
            writeln!(f, "All parameters used as given.")?;
        }
        Ok(())
    }
}
