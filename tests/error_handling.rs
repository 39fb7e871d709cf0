//! Error handling integration tests.
//!
//! These tests verify that failures carry enough context to diagnose a run
//! without repeating it.

use std::{path::PathBuf, time::Duration};

use video2pdf::{
    PipelineFailure, PipelineStage, RawParameters, ToolPaths, Video2PdfError, YtDlpFetcher,
    fetch_video,
};

#[test]
fn extraction_failure_exposes_command_output_and_hint() {
    let error = Video2PdfError::ExtractionFailed {
        exit_code: Some(1),
        command: "ffmpeg -i video.mp4".to_string(),
        output: "moov atom not found".to_string(),
        hint: "Try increasing FPS.".to_string(),
    };

    assert_eq!(
        error.to_string(),
        "FFmpeg failed to extract frames (exit code 1)"
    );
    assert_eq!(error.command(), Some("ffmpeg -i video.mp4"));
    assert_eq!(error.raw_output(), Some("moov atom not found"));
    assert_eq!(error.hint(), Some("Try increasing FPS."));
}

#[test]
fn signal_termination_is_spelled_out() {
    let error = Video2PdfError::FetchFailed {
        exit_code: None,
        command: "yt-dlp".to_string(),
        output: String::new(),
    };
    let message = error.to_string();
    assert!(
        message.contains("terminated by signal"),
        "Error message should mention the signal: {message}",
    );
    assert_eq!(error.hint(), None);
}

#[test]
fn errors_without_tool_context() {
    let error = Video2PdfError::NoFramesFound {
        directory: PathBuf::from("/work/frames"),
    };
    assert_eq!(error.to_string(), "No frames found in /work/frames");
    assert_eq!(error.command(), None);
    assert_eq!(error.raw_output(), None);
}

#[test]
fn timeout_keeps_partial_output() {
    let error = Video2PdfError::ToolTimeout {
        tool: "ffmpeg".to_string(),
        timeout: Duration::from_secs(5),
        command: "ffmpeg -i video.mp4".to_string(),
        output: "frame=  120".to_string(),
    };
    assert!(error.to_string().contains("ffmpeg did not finish within 5s"));
    assert_eq!(error.raw_output(), Some("frame=  120"));
}

#[test]
fn io_errors_convert() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
    let error: Video2PdfError = io.into();
    assert!(matches!(error, Video2PdfError::IoError(_)));
    assert!(error.to_string().contains("read-only"));
}

#[test]
fn pipeline_failure_delegates_to_error() {
    let failure = PipelineFailure::new(
        PipelineStage::Fetch,
        Video2PdfError::FetchFailed {
            exit_code: Some(2),
            command: "yt-dlp -f mp4 -o video.mp4 URL".to_string(),
            output: "ERROR: Video unavailable".to_string(),
        },
    );

    assert_eq!(failure.stage(), PipelineStage::Fetch);
    assert_eq!(
        failure.to_string(),
        "fetch stage failed: Video download failed (exit code 2)"
    );
    assert_eq!(failure.message(), "Video download failed (exit code 2)");
    assert_eq!(failure.raw_output(), Some("ERROR: Video unavailable"));
    let source = std::error::Error::source(&failure).expect("source");
    assert!(source.to_string().contains("exit code 2"));
}

#[test]
fn missing_fetcher_binary_is_unavailable() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let fetcher = YtDlpFetcher::new("video2pdf-test-missing-yt-dlp", None);

    let result = fetch_video(
        &fetcher,
        "https://example.com/v",
        &directory.path().join("video.mp4"),
        None,
    );
    assert!(matches!(result, Err(Video2PdfError::ToolUnavailable { .. })));
}

#[cfg(unix)]
#[test]
fn fetcher_that_exits_cleanly_without_file_fails() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    // `true` ignores its arguments and exits 0 without writing anything.
    let fetcher = YtDlpFetcher::new("true", Some(Duration::from_secs(10)));

    let result = fetch_video(
        &fetcher,
        "https://example.com/v",
        &directory.path().join("video.mp4"),
        None,
    );
    match result {
        Err(Video2PdfError::FetchFailed {
            exit_code, command, ..
        }) => {
            assert_eq!(exit_code, Some(0));
            assert!(command.ends_with("https://example.com/v"));
        }
        other => panic!("expected FetchFailed, got {other:?}"),
    }
}

#[test]
fn plan_only_rejects_blank_url() {
    let pipeline = video2pdf::Pipeline::with_default_tools(
        video2pdf::PipelineConfig::new().with_tools(ToolPaths::default()),
    );
    let failure = pipeline
        .plan_only(&RawParameters::from_url("  "))
        .expect_err("blank URL");
    assert_eq!(failure.stage(), PipelineStage::Normalize);
}
