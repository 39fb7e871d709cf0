//! Parameter normalization tests.

use video2pdf::{ExtractionRequest, RawParameters, SamplingMode, Video2PdfError};

#[test]
fn absent_fields_take_form_defaults() {
    let (request, report) =
        ExtractionRequest::normalize(&RawParameters::from_url("https://example.com/v"))
            .expect("normalize");

    assert_eq!(request.source_url(), "https://example.com/v");
    assert_eq!(request.mode(), SamplingMode::SceneDetect);
    assert_eq!(request.fps_cap(), 0);
    assert!((request.scene_threshold() - 0.20).abs() < f64::EPSILON);
    assert_eq!(request.target_width(), 800);
    assert_eq!(request.max_pages(), 200);
    assert_eq!(request.start_time(), 0);
    assert_eq!(request.end_time(), 0);
    assert!(report.is_clean());
    assert_eq!(report.info.len(), 7);
}

#[test]
fn empty_url_is_invalid_input() {
    for url in ["", "   \t"] {
        let result = ExtractionRequest::normalize(&RawParameters::from_url(url));
        assert!(
            matches!(
                result,
                Err(Video2PdfError::InvalidInput {
                    field: "source_url",
                    ..
                })
            ),
            "URL {url:?} should be rejected"
        );
    }

    let result = ExtractionRequest::normalize(&RawParameters::default());
    assert!(matches!(result, Err(Video2PdfError::InvalidInput { .. })));
}

#[test]
fn url_is_trimmed() {
    let (request, _) =
        ExtractionRequest::normalize(&RawParameters::from_url("  https://example.com/v \n"))
            .expect("normalize");
    assert_eq!(request.source_url(), "https://example.com/v");
}

#[test]
fn only_fps_selects_fixed_rate() {
    let cases = [
        ("fps", SamplingMode::FixedFps),
        (" FPS ", SamplingMode::FixedFps),
        ("scene", SamplingMode::SceneDetect),
        ("FixedFPS", SamplingMode::SceneDetect),
        ("", SamplingMode::SceneDetect),
    ];
    for (input, expected) in cases {
        let raw = RawParameters::from_url("https://example.com/v").with_mode(input);
        let (request, _) = ExtractionRequest::normalize(&raw).expect("normalize");
        assert_eq!(request.mode(), expected, "mode {input:?}");
    }
}

#[test]
fn unknown_mode_is_reported() {
    let raw = RawParameters::from_url("https://example.com/v").with_mode("slideshow");
    let (_, report) = ExtractionRequest::normalize(&raw).expect("normalize");
    assert!(report.warnings.iter().any(|w| w.contains("slideshow")));
}

#[test]
fn numbers_are_clamped_not_rejected() {
    let raw = RawParameters::from_url("https://example.com/v")
        .with_fps("-4")
        .with_scene_threshold("7.5")
        .with_width("120")
        .with_max_pages("0")
        .with_start_time("-30")
        .with_end_time("-1");
    let (request, report) = ExtractionRequest::normalize(&raw).expect("normalize");

    assert_eq!(request.fps_cap(), 0);
    assert!((request.scene_threshold() - 1.0).abs() < f64::EPSILON);
    assert_eq!(request.target_width(), 200);
    assert_eq!(request.max_pages(), 1);
    assert_eq!(request.start_time(), 0);
    assert_eq!(request.end_time(), 0);
    assert_eq!(report.warnings.len(), 6);
}

#[test]
fn malformed_numbers_degrade() {
    let raw = RawParameters::from_url("https://example.com/v")
        .with_fps("fast")
        .with_scene_threshold("low")
        .with_width("wide")
        .with_max_pages("lots")
        .with_start_time("12s")
        .with_end_time("1:30");
    let (request, report) = ExtractionRequest::normalize(&raw).expect("normalize");

    assert_eq!(request.fps_cap(), 0);
    assert!((request.scene_threshold() - 0.01).abs() < f64::EPSILON);
    assert_eq!(request.target_width(), 200);
    assert_eq!(request.max_pages(), 1);
    // Leading digits are used.
    assert_eq!(request.start_time(), 12);
    assert_eq!(request.end_time(), 1);
    assert!(!report.is_clean());
}

#[test]
fn fractional_integers_truncate() {
    let raw = RawParameters::from_url("https://example.com/v")
        .with_fps("2.9")
        .with_width("1024.7");
    let (request, report) = ExtractionRequest::normalize(&raw).expect("normalize");
    assert_eq!(request.fps_cap(), 2);
    assert_eq!(request.target_width(), 1024);
    assert_eq!(report.warnings.len(), 2);
}

#[test]
fn in_range_values_are_used_verbatim() {
    let raw = RawParameters::from_url("https://example.com/v")
        .with_mode("fps")
        .with_fps("3")
        .with_scene_threshold("0.35")
        .with_width("640")
        .with_max_pages("25")
        .with_start_time("15")
        .with_end_time("75");
    let (request, report) = ExtractionRequest::normalize(&raw).expect("normalize");

    assert!(report.is_clean(), "unexpected warnings: {report}");
    assert_eq!(request.fps_cap(), 3);
    assert!((request.scene_threshold() - 0.35).abs() < f64::EPSILON);
    assert_eq!(request.target_width(), 640);
    assert_eq!(request.max_pages(), 25);
    assert_eq!(request.effective_end_time(), Some(75));
}

#[test]
fn inverted_window_is_a_warning() {
    let raw = RawParameters::from_url("https://example.com/v")
        .with_start_time("10")
        .with_end_time("5");
    let (request, report) = ExtractionRequest::normalize(&raw).expect("normalize");

    assert_eq!(request.start_time(), 10);
    assert_eq!(request.end_time(), 5);
    assert_eq!(request.effective_end_time(), None);
    assert!(report.warnings.iter().any(|w| w.contains("end_time")));
}

#[test]
fn fps_mode_without_rate_is_flagged() {
    let raw = RawParameters::from_url("https://example.com/v").with_mode("fps");
    let (request, report) = ExtractionRequest::normalize(&raw).expect("normalize");
    assert_eq!(request.mode(), SamplingMode::FixedFps);
    assert!(report.warnings.iter().any(|w| w.contains("scene detection")));
}

#[test]
fn report_display_lists_entries() {
    let raw = RawParameters::from_url("https://example.com/v").with_width("10");
    let (_, report) = ExtractionRequest::normalize(&raw).expect("normalize");
    let rendered = report.to_string();
    assert!(rendered.contains("[WARN] width"));
    assert!(rendered.contains("[INFO] mode"));
}
