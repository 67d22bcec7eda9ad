//! Error handling integration tests.
//!
//! These tests verify that opening bad inputs fails with the right error
//! before any decoding happens.

use framegrab::{ContainerFormat, FrameGrabError, VideoProbe, VideoSession};

#[test]
fn open_nonexistent_file() {
    let result = VideoSession::open("this_file_does_not_exist.mp4");
    let error = result.unwrap_err();
    assert!(matches!(error, FrameGrabError::NotFound { .. }), "{error}");

    let error_message = error.to_string();
    assert!(
        error_message.contains("this_file_does_not_exist.mp4"),
        "Error message should name the file: {error_message}",
    );
}

#[test]
fn open_matroska_is_unsupported() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temporary_directory.path().join("clip.mkv");
    std::fs::write(&path, [0x1A, 0x45, 0xDF, 0xA3, 0x9F, 0x42, 0x86, 0x81, 0x01])
        .expect("Failed to write file");

    let error = VideoSession::open(&path).unwrap_err();
    assert!(
        matches!(
            error,
            FrameGrabError::UnsupportedFormat {
                format: ContainerFormat::Matroska,
                ..
            }
        ),
        "{error}"
    );
}

#[test]
fn open_avi_is_unsupported() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temporary_directory.path().join("clip.mp4");
    let mut header = b"RIFF\x24\0\0\0AVI LIST".to_vec();
    header.resize(64, 0);
    std::fs::write(&path, header).expect("Failed to write file");

    // The extension does not matter; the header does.
    let error = VideoSession::open(&path).unwrap_err();
    assert!(
        matches!(error, FrameGrabError::UnsupportedFormat { format: ContainerFormat::Avi, .. }),
        "{error}"
    );
}

#[test]
fn open_garbage_is_unsupported() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&path, b"this is not a media file").expect("Failed to write invalid file");

    let error = VideoProbe::probe(&path).unwrap_err();
    assert!(matches!(error, FrameGrabError::UnsupportedFormat { .. }), "{error}");
}

#[test]
fn open_corrupt_mp4_is_not_reported_missing() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temporary_directory.path().join("truncated.mp4");
    let mut contents = b"\0\0\0\x18ftypisom\0\0\x02\0isomiso2".to_vec();
    contents.extend((0..256).map(|i| (i * 37 % 251) as u8));
    std::fs::write(&path, contents).expect("Failed to write file");

    assert_eq!(ContainerFormat::detect(&path).expect("Detect failed"), ContainerFormat::Mp4);
    let error = VideoSession::open(&path).unwrap_err();
    assert!(!matches!(error, FrameGrabError::NotFound { .. }), "{error}");
}

#[test]
fn probe_many_reports_each_file_in_order() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let garbage = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&garbage, b"this is not a media file").expect("Failed to write invalid file");
    let missing = temporary_directory.path().join("missing.mp4");

    let results = VideoProbe::probe_many(&[missing, garbage]);
    assert_eq!(results.len(), 2);
    assert!(matches!(results[0], Err(FrameGrabError::NotFound { .. })));
    assert!(matches!(results[1], Err(FrameGrabError::UnsupportedFormat { .. })));
}

#[test]
fn invalid_argument_family() {
    assert!(FrameGrabError::InvalidArgument("x".to_string()).is_invalid_argument());
    assert!(FrameGrabError::FrameOutOfRange { index: 3, total: 3 }.is_invalid_argument());
    assert!(
        FrameGrabError::InvalidTimestamp {
            seconds: -1.0,
            duration: 2.0
        }
        .is_invalid_argument()
    );
    assert!(!FrameGrabError::NoVideoStream.is_invalid_argument());
}
