//! Frame listing, natural ordering, and page capping.
//!
//! Frames are named `frame_<index>.jpg` by the decoder. Lexical order breaks
//! once an index outgrows its zero padding (`frame_10000.jpg` would sort
//! before `frame_9999.jpg`), so frames are ordered with [`natural_cmp`].

use std::cmp::Ordering;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::Video2PdfError;

const FRAME_PREFIX: &str = "frame_";
const FRAME_EXTENSION: &str = ".jpg";

/// Compare two strings, treating runs of ASCII digits as numbers.
///
/// Digit runs compare by numeric value (of any length, without overflow);
/// everything else compares byte-wise. Strings that are numerically equal but
/// spelled differently (`"a01"` and `"a1"`) fall back to plain string order so
/// the result is a total order.
///
/// # Example
///
/// ```
/// use std::cmp::Ordering;
///
/// use video2pdf::natural_cmp;
///
/// assert_eq!(natural_cmp("frame_0010.jpg", "frame_0009.jpg"), Ordering::Greater);
/// assert_eq!(natural_cmp("frame_0010.jpg", "frame_0100.jpg"), Ordering::Less);
/// assert_eq!(natural_cmp("frame_9999.jpg", "frame_10000.jpg"), Ordering::Less);
/// ```
pub fn natural_cmp(left: &str, right: &str) -> Ordering {
    let mut left_rest = left.as_bytes();
    let mut right_rest = right.as_bytes();

    loop {
        match (left_rest.first(), right_rest.first()) {
            (None, None) => return left.cmp(right),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let (l_digits, l_tail) = split_digits(left_rest);
                let (r_digits, r_tail) = split_digits(right_rest);
                let ordering = compare_digit_runs(l_digits, r_digits);
                if ordering != Ordering::Equal {
                    return ordering;
                }
                left_rest = l_tail;
                right_rest = r_tail;
            }
            (Some(l), Some(r)) => {
                let ordering = l.cmp(r);
                if ordering != Ordering::Equal {
                    return ordering;
                }
                left_rest = &left_rest[1..];
                right_rest = &right_rest[1..];
            }
        }
    }
}

fn split_digits(bytes: &[u8]) -> (&[u8], &[u8]) {
    let end = bytes
        .iter()
        .position(|byte| !byte.is_ascii_digit())
        .unwrap_or(bytes.len());
    bytes.split_at(end)
}

fn compare_digit_runs(left: &[u8], right: &[u8]) -> Ordering {
    let left = strip_leading_zeros(left);
    let right = strip_leading_zeros(right);
    left.len().cmp(&right.len()).then_with(|| left.cmp(right))
}

fn strip_leading_zeros(digits: &[u8]) -> &[u8] {
    let start = digits
        .iter()
        .position(|&byte| byte != b'0')
        .unwrap_or(digits.len());
    &digits[start..]
}

/// Whether `name` follows the decoder's `frame_<digits>.jpg` pattern.
pub fn is_frame_name(name: &str) -> bool {
    name.strip_prefix(FRAME_PREFIX)
        .and_then(|rest| rest.strip_suffix(FRAME_EXTENSION))
        .is_some_and(|index| !index.is_empty() && index.bytes().all(|byte| byte.is_ascii_digit()))
}

/// List frame files in `directory` in natural order.
///
/// A missing directory lists as empty.
pub(crate) fn list_frames(directory: &Path) -> Result<Vec<PathBuf>, Video2PdfError> {
    let entries = match std::fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(error) => return Err(error.into()),
    };

    let mut frames: Vec<(String, PathBuf)> = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if is_frame_name(&name) {
            frames.push((name, entry.path()));
        }
    }

    frames.sort_by(|(left, _), (right, _)| natural_cmp(left, right));
    Ok(frames.into_iter().map(|(_, path)| path).collect())
}

/// An ordered, non-empty set of frame images for one run.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// use video2pdf::FrameSet;
///
/// let frames = FrameSet::collect(Path::new("work/ytp_20240101_120000/frames"))?
///     .capped(50);
/// println!("{} pages, {} dropped", frames.len(), frames.dropped());
/// # Ok::<(), video2pdf::Video2PdfError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSet {
    directory: PathBuf,
    frames: Vec<PathBuf>,
    found: usize,
}

impl FrameSet {
    /// List the frames in `directory`.
    ///
    /// # Errors
    ///
    /// Returns [`Video2PdfError::NoFramesFound`] if no file matches the frame
    /// naming pattern, or an I/O error if the directory cannot be read.
    pub fn collect(directory: &Path) -> Result<Self, Video2PdfError> {
        let frames = list_frames(directory)?;
        if frames.is_empty() {
            return Err(Video2PdfError::NoFramesFound {
                directory: directory.to_path_buf(),
            });
        }
        log::debug!("Found {} frames in {}", frames.len(), directory.display());
        Ok(Self {
            directory: directory.to_path_buf(),
            found: frames.len(),
            frames,
        })
    }

    /// Keep only the first `max_pages` frames.
    ///
    /// Sets at or under the cap are returned unchanged. A cap of zero is
    /// treated as one, so the set never becomes empty.
    #[must_use]
    pub fn capped(mut self, max_pages: u32) -> Self {
        let cap = usize::try_from(max_pages.max(1)).unwrap_or(usize::MAX);
        if self.frames.len() > cap {
            log::warn!(
                "Keeping the first {cap} of {} frames; the rest are dropped",
                self.frames.len()
            );
            self.frames.truncate(cap);
        }
        self
    }

    /// Frame paths in page order.
    pub fn frames(&self) -> &[PathBuf] {
        &self.frames
    }

    /// Number of frames kept.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always `false` for a set built by [`collect`](Self::collect).
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Number of frames found before capping.
    pub fn found(&self) -> usize {
        self.found
    }

    /// Number of frames removed by [`capped`](Self::capped).
    pub fn dropped(&self) -> usize {
        self.found - self.frames.len()
    }

    /// Whether capping removed any frames.
    pub fn is_truncated(&self) -> bool {
        self.dropped() > 0
    }

    /// Directory the frames were listed from.
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}
