//! Error types for the `video-tool` crate.
//!
//! This module defines [`VideoToolError`], the unified error type returned by
//! every fallible operation in the crate. Variants fall into four groups:
//! input resolution, decoding, encoding/writing, and plumbing errors from the
//! underlying libraries.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `video-tool` operations.
///
/// Batch operations do not return per-file errors directly; they collect them
/// in a [`BatchReport`](crate::BatchReport) or
/// [`MergeReport`](crate::MergeReport) and only return `Err` when the whole
/// invocation cannot proceed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VideoToolError {
    /// The input path does not exist.
    #[error("Input path does not exist: {path}")]
    InputNotFound {
        /// Path that was given to the operation.
        path: PathBuf,
    },

    /// The input exists but contains no recognized video files.
    #[error("No input found: no recognized video files under {path}")]
    NoInputFound {
        /// Directory (or special file) that was searched.
        path: PathBuf,
    },

    /// A single-file input does not carry a recognized video extension.
    #[error("Unsupported video format: {path}")]
    UnsupportedFormat {
        /// The rejected file.
        path: PathBuf,
    },

    /// The merge operation was given something other than a directory.
    #[error("Merging requires a directory as input: {path}")]
    NotADirectory {
        /// The rejected path.
        path: PathBuf,
    },

    /// The video file could not be opened for decoding.
    #[error("Unreadable source {path}: {reason}")]
    FileOpen {
        /// The file that failed to open.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file opened but has no video stream.
    #[error("No video stream found in {path}")]
    NoVideoStream {
        /// The file without a video stream.
        path: PathBuf,
    },

    /// The source opened but produced no decodable frames.
    #[error("No readable frames in {path}")]
    NoReadableFrames {
        /// The file (or merge root) that produced nothing.
        path: PathBuf,
    },

    /// The output path is already taken by another file.
    #[error("Output already exists, refusing to overwrite: {path}")]
    OutputExists {
        /// The existing file.
        path: PathBuf,
    },

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// The encoder could not be created or rejected a frame.
    #[error("Video encoding error: {0}")]
    VideoEncodeError(String),

    /// The output container could not be created or written.
    #[error("Video write error: {0}")]
    VideoWriteError(String),

    /// A frame handed to a sink does not match the sink's fixed dimensions.
    #[error("Frame is {actual_width}x{actual_height} but the sink expects {expected_width}x{expected_height}")]
    FrameSizeMismatch {
        /// Sink width.
        expected_width: u32,
        /// Sink height.
        expected_height: u32,
        /// Width of the rejected frame.
        actual_width: u32,
        /// Height of the rejected frame.
        actual_height: u32,
    },

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while writing a still image.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl From<FfmpegError> for VideoToolError {
    fn from(error: FfmpegError) -> Self {
        VideoToolError::FfmpegError(error.to_string())
    }
}

impl VideoToolError {
    /// Returns `true` for errors raised while resolving the input path.
    ///
    /// These are always fatal for the invocation, even in batch mode.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            VideoToolError::InputNotFound { .. }
                | VideoToolError::NoInputFound { .. }
                | VideoToolError::UnsupportedFormat { .. }
                | VideoToolError::NotADirectory { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_classified() {
        let missing = VideoToolError::InputNotFound {
            path: PathBuf::from("nope"),
        };
        let unreadable = VideoToolError::FileOpen {
            path: PathBuf::from("bad.mp4"),
            reason: "Invalid data found when processing input".to_string(),
        };

        assert!(missing.is_input_error());
        assert!(!unreadable.is_input_error());
    }

    #[test]
    fn messages_carry_context() {
        let error = VideoToolError::FrameSizeMismatch {
            expected_width: 640,
            expected_height: 480,
            actual_width: 320,
            actual_height: 240,
        };
        assert_eq!(
            error.to_string(),
            "Frame is 320x240 but the sink expects 640x480"
        );

        let error = VideoToolError::NoInputFound {
            path: PathBuf::from("clips"),
        };
        assert!(error.to_string().starts_with("No input found"));

        let error = VideoToolError::OutputExists {
            path: PathBuf::from("clips/a.mp4"),
        };
        assert!(!error.is_input_error());
        assert!(error.to_string().ends_with("clips/a.mp4"));
    }
}
