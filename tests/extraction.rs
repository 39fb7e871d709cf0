//! Frame extraction tests.

mod common;

use std::{fs, path::Path};

use common::FakeDecoder;
use video2pdf::{
    ExtractionRequest, FfmpegDecoder, RawParameters, RunContext, SamplingDirective, SamplingMode,
    Video2PdfError, extract_frames,
};

fn directive(raw: RawParameters) -> SamplingDirective {
    let (request, _) = ExtractionRequest::normalize(&raw).expect("normalize");
    SamplingDirective::plan(&request)
}

fn argv(raw: RawParameters) -> Vec<String> {
    FfmpegDecoder::new("ffmpeg", None)
        .command(
            Path::new("/run/video.mp4"),
            &directive(raw),
            Path::new("/run/frames/frame_%04d.jpg"),
        )
        .arguments()
        .iter()
        .map(|argument| argument.to_string_lossy().into_owned())
        .collect()
}

#[test]
fn seek_and_duration_precede_input() {
    let arguments = argv(
        RawParameters::from_url("https://example.com/v")
            .with_start_time("10")
            .with_end_time("40"),
    );
    assert_eq!(
        arguments,
        [
            "-ss",
            "10",
            "-t",
            "30",
            "-i",
            "/run/video.mp4",
            "-vf",
            "select='gt(scene,0.2)',scale=800:-1:flags=lanczos",
            "-vsync",
            "vfr",
            "-y",
            "/run/frames/frame_%04d.jpg",
            "-hide_banner",
            "-loglevel",
            "error",
        ]
    );
}

#[test]
fn unbounded_window_omits_seek_flags() {
    let arguments = argv(
        RawParameters::from_url("https://example.com/v")
            .with_start_time("10")
            .with_end_time("5"),
    );
    assert_eq!(&arguments[..2], ["-ss", "10"]);
    assert!(!arguments.iter().any(|argument| argument == "-t"));

    let arguments = argv(RawParameters::from_url("https://example.com/v"));
    assert_eq!(arguments[0], "-i");
}

#[test]
fn writes_frames_and_debug_log() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let context = RunContext::create(root.path()).expect("context");
    let decoder = FakeDecoder {
        output: "frame=    4 fps=0.0".to_string(),
        ..FakeDecoder::producing(4)
    };

    let outcome = extract_frames(
        &context,
        &directive(RawParameters::from_url("https://example.com/v")),
        SamplingMode::SceneDetect,
        &decoder,
        None,
    )
    .expect("extract");

    assert_eq!(outcome.frame_count, 4);
    let log = fs::read_to_string(context.debug_log_path()).expect("debug log");
    assert_eq!(log, format!("{}\n\nframe=    4 fps=0.0", outcome.command));
}

#[test]
fn rerun_leaves_only_new_frames() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let context = RunContext::create(root.path()).expect("context");
    let plan = directive(RawParameters::from_url("https://example.com/v"));

    extract_frames(&context, &plan, SamplingMode::SceneDetect, &FakeDecoder::producing(6), None)
        .expect("first run");
    fs::write(context.frames_directory().join("stray.txt"), b"x").unwrap();
    fs::create_dir(context.frames_directory().join("nested")).unwrap();

    let outcome =
        extract_frames(&context, &plan, SamplingMode::SceneDetect, &FakeDecoder::producing(2), None)
            .expect("second run");
    assert_eq!(outcome.frame_count, 2);

    let mut remaining: Vec<_> = fs::read_dir(context.frames_directory())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    remaining.sort();
    assert_eq!(remaining, ["frame_0001.jpg", "frame_0002.jpg"]);
}

#[test]
fn clean_exit_without_frames_is_failure() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let context = RunContext::create(root.path()).expect("context");

    let result = extract_frames(
        &context,
        &directive(RawParameters::from_url("https://example.com/v")),
        SamplingMode::SceneDetect,
        &FakeDecoder::producing(0),
        None,
    );

    match result {
        Err(Video2PdfError::ExtractionFailed {
            exit_code, hint, ..
        }) => {
            assert_eq!(exit_code, Some(0));
            assert!(hint.contains("scene threshold"));
        }
        other => panic!("expected ExtractionFailed, got {other:?}"),
    }
    assert!(context.debug_log_path().exists());
}

#[test]
fn non_zero_exit_is_failure_with_output() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let context = RunContext::create(root.path()).expect("context");
    let decoder = FakeDecoder::exiting(1, 3, "Invalid data found when processing input");

    let error = extract_frames(
        &context,
        &directive(RawParameters::from_url("https://example.com/v").with_mode("fps").with_fps("1")),
        SamplingMode::FixedFps,
        &decoder,
        None,
    )
    .expect_err("non-zero exit must fail");

    assert_eq!(error.raw_output(), Some("Invalid data found when processing input"));
    assert!(error.command().unwrap().starts_with("fake-ffmpeg"));
    assert_eq!(error.hint(), Some("Try increasing FPS."));
}

#[test]
fn missing_frames_directory_is_created() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let context = RunContext::create(root.path()).expect("context");
    assert!(!context.frames_directory().exists());

    extract_frames(
        &context,
        &directive(RawParameters::from_url("https://example.com/v")),
        SamplingMode::SceneDetect,
        &FakeDecoder::producing(1),
        None,
    )
    .expect("extract");
    assert!(context.frames_directory().is_dir());
}

#[test]
fn missing_decoder_still_records_the_command() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let context = RunContext::create(root.path()).expect("context");
    let decoder = FfmpegDecoder::new(root.path().join("no-such-ffmpeg"), None);

    let result = extract_frames(
        &context,
        &directive(RawParameters::from_url("https://example.com/v")),
        SamplingMode::SceneDetect,
        &decoder,
        None,
    );

    let error = result.expect_err("spawn must fail");
    assert!(matches!(error, Video2PdfError::ToolUnavailable { .. }));
    let command = error.command().expect("command recorded");
    assert!(command.contains("no-such-ffmpeg"));
    assert!(command.contains("-vsync vfr"));

    let log = fs::read_to_string(context.debug_log_path()).expect("debug log");
    assert_eq!(log, format!("{command}\n\n"));
}
