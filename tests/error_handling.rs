//! Error handling integration tests.
//!
//! These tests verify that input problems surface as meaningful errors
//! before any media is touched.

use video_tool::{ProcessOptions, VideoHandle, VideoToolError};

#[test]
fn missing_input_is_reported_by_every_operation() {
    let options = ProcessOptions::new();
    let missing = "this_path_does_not_exist/clip.avi";

    for result in [
        video_tool::extract_frames(missing, &options).map(|_| ()),
        video_tool::convert_to_mp4(missing, &options).map(|_| ()),
        video_tool::merge_videos(missing, &options).map(|_| ()),
    ] {
        let error = result.unwrap_err();
        assert!(matches!(error, VideoToolError::InputNotFound { .. }));
        assert!(error.is_input_error());
        assert!(
            error.to_string().contains("does not exist"),
            "Error message should mention the missing path: {error}",
        );
    }
}

#[test]
fn unsupported_single_file_is_rejected() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temporary_directory.path().join("animation.gif");
    std::fs::write(&path, b"GIF89a").expect("Failed to write file");

    let result = video_tool::extract_frames(&path, &ProcessOptions::new());

    let error = result.unwrap_err();
    assert!(matches!(error, VideoToolError::UnsupportedFormat { .. }));
    assert!(error.to_string().contains("animation.gif"));
}

#[test]
fn directory_without_videos_has_no_input() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    std::fs::write(temporary_directory.path().join("notes.txt"), "text").unwrap();

    let result = video_tool::convert_to_mp4(temporary_directory.path(), &ProcessOptions::new());

    let error = result.unwrap_err();
    assert!(matches!(error, VideoToolError::NoInputFound { .. }));
    assert!(error.to_string().starts_with("No input found"));
}

#[test]
fn empty_directory_merge_creates_nothing() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let root = temporary_directory.path().join("empty");
    std::fs::create_dir(&root).unwrap();

    let result = video_tool::merge_videos(&root, &ProcessOptions::new());

    assert!(matches!(result, Err(VideoToolError::NoInputFound { .. })));
    assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);
}

#[test]
fn merge_requires_a_directory() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = temporary_directory.path().join("clip.mp4");
    std::fs::write(&path, b"").unwrap();

    let error = video_tool::merge_videos(&path, &ProcessOptions::new()).unwrap_err();

    assert!(matches!(error, VideoToolError::NotADirectory { .. }));
    assert!(error.to_string().contains("requires a directory"));
}

#[test]
fn open_invalid_file() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid_file_path = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&invalid_file_path, b"this is not a media file")
        .expect("Failed to write invalid file");

    let error = VideoHandle::open(&invalid_file_path).unwrap_err();

    assert!(!error.is_input_error());
    assert!(
        error.to_string().contains("invalid.mp4"),
        "Error message should name the file: {error}",
    );
}
