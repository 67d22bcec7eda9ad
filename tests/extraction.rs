//! Extraction driver integration tests.
//!
//! Runs against the synthetic source; writes into temporary directories.

mod common;

use std::{
    fs,
    sync::{Arc, Mutex},
};

use common::{SyntheticAdapter, ten_frame_session};
use framegrab::{
    CancellationToken, ExtractOptions, FrameGrabError, ImageFormat, ProgressCallback, ProgressInfo,
    SIDECAR_FILE_NAME, VideoSession, create_run_directory, extract_all, extract_session,
};

#[derive(Default)]
struct RecordProgress {
    seen: Mutex<Vec<u64>>,
}

impl ProgressCallback for RecordProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.seen.lock().unwrap().push(info.current);
    }
}

// ── successful runs ────────────────────────────────────────────────

#[test]
fn writes_sidecar_and_one_image_per_frame() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let (mut session, counters) = ten_frame_session();

    let options = ExtractOptions::new().with_output_root(root.path());
    let report = extract_session(&mut session, &options).expect("Extraction failed");

    assert_eq!(report.frames_written, 10);
    assert_eq!(report.image_format, ImageFormat::Png);
    assert!(report.run_directory.starts_with(root.path()));
    assert_eq!(report.sidecar, report.run_directory.join(SIDECAR_FILE_NAME));

    let sidecar = fs::read_to_string(&report.sidecar).expect("Failed to read sidecar");
    let lines: Vec<&str> = sidecar.lines().collect();
    assert_eq!(lines, vec!["10", "4", "4", "5.0", "2.0"]);

    for index in 0..10 {
        let path = report.run_directory.join(format!("frame{index}.png"));
        let image = image::open(&path)
            .unwrap_or_else(|error| panic!("{}: {error}", path.display()))
            .to_rgb8();
        assert_eq!(image.dimensions(), (4, 4));
    }
    assert_eq!(fs::read_dir(&report.run_directory).unwrap().count(), 11);

    // Frames are fetched in order, so extraction never seeks.
    assert_eq!(counters.seeks(), 0);
}

#[test]
fn image_format_controls_encoder_and_extension() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let mut session = VideoSession::from_adapter(SyntheticAdapter::new(2, 8, 8, 1.0));

    let options = ExtractOptions::new()
        .with_output_root(root.path())
        .with_image_format(ImageFormat::Bmp);
    let report = extract_session(&mut session, &options).expect("Extraction failed");

    let path = report.run_directory.join("frame1.bmp");
    let bytes = fs::read(&path).expect("Missing frame file");
    assert_eq!(&bytes[..2], b"BM");
}

#[test]
fn each_run_gets_a_fresh_directory() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let options = ExtractOptions::new().with_output_root(root.path());

    let (mut first, _) = ten_frame_session();
    let (mut second, _) = ten_frame_session();
    let a = extract_session(&mut first, &options).expect("Extraction failed");
    let b = extract_session(&mut second, &options).expect("Extraction failed");
    assert_ne!(a.run_directory, b.run_directory);
}

#[test]
fn progress_reports_every_batch() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let progress = Arc::new(RecordProgress::default());
    let options = ExtractOptions::new()
        .with_output_root(root.path())
        .with_progress(progress.clone())
        .with_batch_size(4);

    let (mut session, _) = ten_frame_session();
    extract_session(&mut session, &options).expect("Extraction failed");

    assert_eq!(*progress.seen.lock().unwrap(), vec![4, 8, 10]);
}

// ── failures ───────────────────────────────────────────────────────

#[test]
fn decode_error_aborts_the_run() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let mut session = VideoSession::from_adapter(SyntheticAdapter::new(10, 4, 4, 2.0).failing_at(6));

    let options = ExtractOptions::new().with_output_root(root.path());
    let error = extract_session(&mut session, &options).unwrap_err();
    assert!(matches!(error, FrameGrabError::DecodeError { index: 6, .. }), "{error}");

    let run_directory = fs::read_dir(root.path())
        .unwrap()
        .next()
        .expect("Run directory missing")
        .unwrap()
        .path();
    assert!(run_directory.join("frame5.png").exists());
    assert!(!run_directory.join("frame6.png").exists());
    assert!(!run_directory.join("frame7.png").exists());
}

#[test]
fn cancelled_run_stops_before_decoding() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let token = CancellationToken::new();
    token.cancel();

    let (mut session, counters) = ten_frame_session();
    let options = ExtractOptions::new()
        .with_output_root(root.path())
        .with_cancellation(token);
    let error = extract_session(&mut session, &options).unwrap_err();
    assert!(matches!(error, FrameGrabError::Cancelled));
    assert_eq!(counters.decodes(), 0);
}

#[test]
fn missing_output_root_aborts_before_decoding() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let (mut session, counters) = ten_frame_session();

    let options = ExtractOptions::new().with_output_root(root.path().join("missing"));
    let error = extract_session(&mut session, &options).unwrap_err();
    assert!(matches!(error, FrameGrabError::IoError(_)), "{error}");
    assert_eq!(counters.decodes(), 0);
}

#[test]
fn missing_input_creates_no_directory() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let options = ExtractOptions::new().with_output_root(root.path());

    let error = extract_all(root.path().join("absent.mp4"), &options).unwrap_err();
    assert!(matches!(error, FrameGrabError::NotFound { .. }), "{error}");
    assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
}

#[test]
fn run_directories_are_created_not_reused() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let first = create_run_directory(root.path()).expect("Failed to create run directory");
    let second = create_run_directory(root.path()).expect("Failed to create run directory");
    assert!(first.is_dir() && second.is_dir());
    assert_ne!(first, second);
}
