//! Document assembly.
//!
//! [`assemble`] lays out one frame per page and persists the result
//! atomically: the document is written to a temporary file beside the target
//! and renamed into place only once it is complete, so a failed run never
//! leaves a truncated `output.pdf` behind.
//!
//! Rendering is behind the [`DocumentWriter`] trait. [`PdfDocumentWriter`]
//! embeds each JPEG unmodified as a PDF image, so frames are never
//! re-encoded.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::{ColorType, ImageDecoder, ImageFormat, ImageReader};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document as PdfDocument, Object, ObjectId, Stream, dictionary};
use tempfile::NamedTempFile;

use crate::curate::FrameSet;
use crate::error::Video2PdfError;

const POINTS_PER_MM: f64 = 72.0 / 25.4;

/// Page geometry, in millimetres.
///
/// The default is A4 portrait with the image 15 mm from the top-left corner,
/// 180 mm wide, and a 10 mm bottom margin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    /// Page width.
    pub page_width_mm: f64,
    /// Page height.
    pub page_height_mm: f64,
    /// Distance from the left edge to the image.
    pub left_mm: f64,
    /// Distance from the top edge to the image.
    pub top_mm: f64,
    /// Rendered image width.
    pub image_width_mm: f64,
    /// Space kept free below the image.
    pub bottom_margin_mm: f64,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            left_mm: 15.0,
            top_mm: 15.0,
            image_width_mm: 180.0,
            bottom_margin_mm: 10.0,
        }
    }
}

/// Where an image lands on a page, in PDF points with the origin at the
/// bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Left edge.
    pub x: f64,
    /// Bottom edge.
    pub y: f64,
    /// Rendered width.
    pub width: f64,
    /// Rendered height.
    pub height: f64,
}

impl PageLayout {
    /// Page size in points.
    pub fn page_size_points(&self) -> (f64, f64) {
        (
            self.page_width_mm * POINTS_PER_MM,
            self.page_height_mm * POINTS_PER_MM,
        )
    }

    /// Place an image of `pixel_width` × `pixel_height`.
    ///
    /// The height follows from the aspect ratio. An image that would reach
    /// into the bottom margin is scaled down uniformly, keeping its top-left
    /// corner fixed.
    ///
    /// # Example
    ///
    /// ```
    /// use video2pdf::PageLayout;
    ///
    /// let layout = PageLayout::default();
    /// let placement = layout.place(1600, 900);
    /// // 180 mm wide, 101.25 mm tall.
    /// assert!((placement.width - 510.236).abs() < 0.01);
    /// assert!((placement.height - 287.008).abs() < 0.01);
    /// ```
    pub fn place(&self, pixel_width: u32, pixel_height: u32) -> Placement {
        let mut width_mm = self.image_width_mm;
        let mut height_mm = if pixel_width == 0 {
            0.0
        } else {
            width_mm * f64::from(pixel_height) / f64::from(pixel_width)
        };

        let available_mm = (self.page_height_mm - self.top_mm - self.bottom_margin_mm).max(0.0);
        if height_mm > available_mm {
            let scale = available_mm / height_mm;
            width_mm *= scale;
            height_mm = available_mm;
        }

        let bottom_mm = self.page_height_mm - self.top_mm - height_mm;
        Placement {
            x: self.left_mm * POINTS_PER_MM,
            y: bottom_mm * POINTS_PER_MM,
            width: width_mm * POINTS_PER_MM,
            height: height_mm * POINTS_PER_MM,
        }
    }
}

/// Renders an ordered list of frames into a document.
pub trait DocumentWriter: Send + Sync {
    /// Write one page per entry of `frames`, in order, to `sink`.
    ///
    /// Returns the number of pages written.
    fn write(
        &self,
        frames: &[PathBuf],
        layout: &PageLayout,
        sink: &mut dyn Write,
    ) -> Result<usize, Video2PdfError>;
}

/// [`DocumentWriter`] producing a PDF with `lopdf`.
#[derive(Debug, Clone)]
pub struct PdfDocumentWriter {
    title: String,
    creator: String,
}

impl Default for PdfDocumentWriter {
    fn default() -> Self {
        Self::new("Video frames")
    }
}

impl PdfDocumentWriter {
    /// Writer that stamps `title` into the document information.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            creator: format!("video2pdf {}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl DocumentWriter for PdfDocumentWriter {
    fn write(
        &self,
        frames: &[PathBuf],
        layout: &PageLayout,
        sink: &mut dyn Write,
    ) -> Result<usize, Video2PdfError> {
        let mut pdf = PdfDocument::with_version("1.5");
        let pages_id = pdf.new_object_id();
        let (page_width, page_height) = layout.page_size_points();

        let mut kids = Vec::with_capacity(frames.len());
        for frame in frames {
            let image = JpegFrame::load(frame)?;
            let placement = layout.place(image.width, image.height);
            let page_id = add_page(&mut pdf, pages_id, (page_width, page_height), image, placement)?;
            kids.push(Object::Reference(page_id));
        }

        let page_count = kids.len();
        pdf.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count as i64,
            }),
        );
        let catalog_id = pdf.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = pdf.add_object(dictionary! {
            "Title" => Object::string_literal(self.title.as_str()),
            "Creator" => Object::string_literal(self.creator.as_str()),
        });
        pdf.trailer.set("Root", catalog_id);
        pdf.trailer.set("Info", info_id);

        let mut sink = sink;
        pdf.save_to(&mut sink)
            .map_err(|error| Video2PdfError::AssemblyFailed {
                reason: format!("could not serialize PDF: {error}"),
            })?;
        Ok(page_count)
    }
}

/// A JPEG read from disk with the facts needed to embed it.
struct JpegFrame {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    gray: bool,
}

impl JpegFrame {
    fn load(path: &Path) -> Result<Self, Video2PdfError> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        if reader.format() != Some(ImageFormat::Jpeg) {
            return Err(Video2PdfError::AssemblyFailed {
                reason: format!("{} is not a JPEG image", path.display()),
            });
        }
        let decoder = reader.into_decoder()?;
        let (width, height) = decoder.dimensions();
        let gray = matches!(decoder.color_type(), ColorType::L8 | ColorType::L16);

        Ok(Self {
            bytes: fs::read(path)?,
            width,
            height,
            gray,
        })
    }
}

fn add_page(
    pdf: &mut PdfDocument,
    pages_id: ObjectId,
    (page_width, page_height): (f64, f64),
    image: JpegFrame,
    placement: Placement,
) -> Result<ObjectId, Video2PdfError> {
    let color_space = if image.gray { "DeviceGray" } else { "DeviceRGB" };
    let image_stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(image.width),
            "Height" => i64::from(image.height),
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8_i64,
            "Filter" => "DCTDecode",
        },
        image.bytes,
    )
    .with_compression(false);
    let image_id = pdf.add_object(image_stream);

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    real(placement.width),
                    real(0.0),
                    real(0.0),
                    real(placement.height),
                    real(placement.x),
                    real(placement.y),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Frame".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content
        .encode()
        .map_err(|error| Video2PdfError::AssemblyFailed {
            reason: format!("could not encode page content: {error}"),
        })?;
    let content_id = pdf.add_object(Stream::new(Dictionary::new(), encoded));

    Ok(pdf.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![real(0.0), real(0.0), real(page_width), real(page_height)],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                "Frame" => image_id,
            },
        },
    }))
}

fn real(value: f64) -> Object {
    Object::from(value)
}

/// A finished document on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Where the document was written.
    pub path: PathBuf,
    /// Number of pages, equal to the number of frames given.
    pub page_count: usize,
}

/// Render `frames` with `writer` and persist the result at `output_path`.
///
/// The file at `output_path` is replaced only if rendering succeeds.
///
/// # Errors
///
/// Returns [`Video2PdfError::AssemblyFailed`] for an empty frame set or a
/// rendering failure, and I/O errors from writing or renaming the file.
pub fn assemble(
    frames: &FrameSet,
    layout: &PageLayout,
    writer: &dyn DocumentWriter,
    output_path: &Path,
) -> Result<Document, Video2PdfError> {
    if frames.is_empty() {
        return Err(Video2PdfError::AssemblyFailed {
            reason: "no frames to place".to_string(),
        });
    }

    let directory = match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staging = NamedTempFile::new_in(directory)?;

    let page_count = {
        let mut buffered = BufWriter::new(staging.as_file_mut());
        let page_count = writer.write(frames.frames(), layout, &mut buffered)?;
        buffered.flush()?;
        page_count
    };
    staging.as_file().sync_all()?;

    staging
        .persist(output_path)
        .map_err(|error| Video2PdfError::IoError(error.error))?;

    log::info!("Wrote {page_count} pages to {}", output_path.display());
    Ok(Document {
        path: output_path.to_path_buf(),
        page_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-6;

    #[test]
    fn landscape_frame_keeps_full_width() {
        let layout = PageLayout::default();
        let placement = layout.place(800, 450);
        assert!((placement.width - 180.0 * POINTS_PER_MM).abs() < EPSILON);
        assert!((placement.height - 101.25 * POINTS_PER_MM).abs() < EPSILON);
        assert!((placement.x - 15.0 * POINTS_PER_MM).abs() < EPSILON);
        // Top edge sits 15 mm below the top of the page.
        let top = placement.y + placement.height;
        assert!((top - 282.0 * POINTS_PER_MM).abs() < EPSILON);
    }

    #[test]
    fn tall_frame_is_shrunk_above_bottom_margin() {
        let layout = PageLayout::default();
        let placement = layout.place(450, 1600);
        assert!((placement.y - 10.0 * POINTS_PER_MM).abs() < EPSILON);
        assert!((placement.height - 272.0 * POINTS_PER_MM).abs() < EPSILON);
        let expected_width = 272.0 * 450.0 / 1600.0 * POINTS_PER_MM;
        assert!((placement.width - expected_width).abs() < EPSILON);
    }
}
