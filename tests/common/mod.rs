//! Shared fakes for integration tests.
//!
//! `FakeFetcher` and `FakeDecoder` stand in for yt-dlp and ffmpeg so the
//! pipeline can be exercised without network access or external binaries.
//! Frames are real JPEGs written with the `image` crate.

#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use image::{GrayImage, Luma, Rgb, RgbImage};
use video2pdf::{
    CancellationToken, FrameDecoder, SamplingDirective, ToolOutput, Video2PdfError, VideoFetcher,
};

/// Write an RGB JPEG of the given size.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    image.save(path).expect("Failed to write JPEG");
}

/// Write a single-channel JPEG of the given size.
pub fn write_gray_jpeg(path: &Path, width: u32, height: u32) {
    let image = GrayImage::from_fn(width, height, |x, _| Luma([(x % 256) as u8]));
    image.save(path).expect("Failed to write JPEG");
}

/// Width of the `index`-th (1-based) fake frame; lets tests recover order
/// from a finished PDF.
pub fn frame_width(index: usize) -> u32 {
    200 + index as u32 * 8
}

/// Widths of the embedded images, page by page.
pub fn pdf_image_widths(path: &Path) -> Vec<i64> {
    let document = lopdf::Document::load(path).expect("Failed to load PDF");
    document
        .get_pages()
        .values()
        .map(|&page_id| {
            let page = document
                .get_object(page_id)
                .and_then(|object| object.as_dict())
                .expect("page dictionary");
            let image_id = page
                .get(b"Resources")
                .and_then(|object| object.as_dict())
                .and_then(|resources| resources.get(b"XObject"))
                .and_then(|object| object.as_dict())
                .and_then(|xobjects| xobjects.get(b"Frame"))
                .and_then(|object| object.as_reference())
                .expect("image reference");
            document
                .get_object(image_id)
                .and_then(|object| object.as_stream())
                .and_then(|stream| stream.dict.get(b"Width"))
                .and_then(|object| object.as_i64())
                .expect("image width")
        })
        .collect()
}

/// Fetcher that writes a placeholder file instead of downloading.
#[derive(Clone)]
pub struct FakeFetcher {
    pub exit_code: Option<i32>,
    pub write_file: bool,
    pub output: String,
    pub calls: Arc<AtomicUsize>,
}

impl FakeFetcher {
    pub fn succeeding() -> Self {
        Self {
            exit_code: Some(0),
            write_file: true,
            output: String::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(exit_code: i32, output: &str) -> Self {
        Self {
            exit_code: Some(exit_code),
            write_file: false,
            output: output.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl VideoFetcher for FakeFetcher {
    fn fetch(
        &self,
        url: &str,
        destination: &Path,
        _cancellation: Option<&CancellationToken>,
    ) -> Result<ToolOutput, Video2PdfError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.write_file {
            std::fs::write(destination, b"not really a video")?;
        }
        Ok(ToolOutput {
            command: format!("fake-fetch -o {} {url}", destination.display()),
            exit_code: self.exit_code,
            output: self.output.clone(),
        })
    }
}

/// Decoder that writes `frames` JPEGs following the output pattern.
#[derive(Clone)]
pub struct FakeDecoder {
    pub frames: usize,
    pub exit_code: Option<i32>,
    pub output: String,
    pub calls: Arc<AtomicUsize>,
    pub directives: Arc<Mutex<Vec<SamplingDirective>>>,
    pub cancel_on_decode: Option<CancellationToken>,
}

impl FakeDecoder {
    pub fn producing(frames: usize) -> Self {
        Self {
            frames,
            exit_code: Some(0),
            output: String::new(),
            calls: Arc::new(AtomicUsize::new(0)),
            directives: Arc::new(Mutex::new(Vec::new())),
            cancel_on_decode: None,
        }
    }

    pub fn exiting(exit_code: i32, frames: usize, output: &str) -> Self {
        Self {
            exit_code: Some(exit_code),
            output: output.to_string(),
            ..Self::producing(frames)
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_directive(&self) -> Option<SamplingDirective> {
        self.directives.lock().unwrap().last().cloned()
    }
}

impl FrameDecoder for FakeDecoder {
    fn decode(
        &self,
        video: &Path,
        directive: &SamplingDirective,
        output_pattern: &Path,
        _cancellation: Option<&CancellationToken>,
    ) -> Result<ToolOutput, Video2PdfError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.directives.lock().unwrap().push(directive.clone());

        let directory = output_pattern.parent().expect("pattern has a directory");
        for index in 1..=self.frames {
            write_jpeg(
                &directory.join(format!("frame_{index:04}.jpg")),
                frame_width(index),
                120,
            );
        }
        if let Some(token) = &self.cancel_on_decode {
            token.cancel();
        }

        Ok(ToolOutput {
            command: format!(
                "fake-ffmpeg -i {} -vf {} {}",
                video.display(),
                directive.filter_expression,
                output_pattern.display()
            ),
            exit_code: self.exit_code,
            output: self.output.clone(),
        })
    }
}

/// Frame paths `frame_0001.jpg ..= frame_<count>.jpg` inside `directory`.
pub fn write_frames(directory: &Path, count: usize) -> Vec<PathBuf> {
    std::fs::create_dir_all(directory).expect("Failed to create frames dir");
    (1..=count)
        .map(|index| {
            let path = directory.join(format!("frame_{index:04}.jpg"));
            write_jpeg(&path, frame_width(index), 120);
            path
        })
        .collect()
}
