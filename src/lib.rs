//! # video-tool
//!
//! Batch video operations over a directory tree: sample still frames, convert
//! to MP4, and concatenate every video under a directory into one file.
//!
//! Decoding and encoding go through FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate. Frames are
//! handled as [`image::RgbImage`] values.
//!
//! ## Quick Start
//!
//! ### Sample One Frame per Second
//!
//! ```no_run
//! use video_tool::{ProcessOptions, VideoToolError};
//!
//! // Writes lecture_frames/lecture_1.png, lecture_2.png, ...
//! let report = video_tool::extract_frames("lecture.avi", &ProcessOptions::new())?;
//! println!("{} images", report.outputs().count());
//! # Ok::<(), VideoToolError>(())
//! ```
//!
//! ### Convert a Directory to MP4
//!
//! ```no_run
//! use video_tool::{ProcessOptions, VideoToolError};
//!
//! let report = video_tool::convert_to_mp4("recordings/", &ProcessOptions::new())?;
//! for failure in &report.failures {
//!     eprintln!("{}: {}", failure.path.display(), failure.error);
//! }
//! # Ok::<(), VideoToolError>(())
//! ```
//!
//! ### Merge a Directory Tree
//!
//! ```no_run
//! use video_tool::{ProcessOptions, VideoToolError};
//!
//! // Writes trip/trip_merged.mp4
//! let report = video_tool::merge_videos("trip/", &ProcessOptions::new())?;
//! println!("{} frames", report.frames_written);
//! # Ok::<(), VideoToolError>(())
//! ```
//!
//! ## Inputs
//!
//! Every operation takes one path. A recognized video file (`mp4`, `avi`,
//! `mkv`, `mov`, `flv`, `wmv`, `webm`) is processed alone; a directory is
//! expanded into the videos it contains. Extraction and conversion look at
//! direct children only, merging walks the whole tree. Per-file failures in a
//! directory are collected in the returned report instead of aborting.
//!
//! Audio is never read or written.
//!
//! ## Backends
//!
//! The operations are generic over a [`MediaBackend`] producing
//! [`FrameSource`]s and [`FrameSink`]s. [`FfmpegBackend`] is the default;
//! other backends can be plugged in through the `with_backend` constructors.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod config;
pub mod convert;
pub mod decode;
pub mod discovery;
pub mod encode;
pub mod error;
pub mod extract;
pub mod ffmpeg;
pub mod media;
pub mod merge;
pub mod metadata;
mod pipeline;
pub mod progress;
pub mod report;
mod utilities;

pub use config::{ProcessOptions, StillFormat};
pub use convert::{FormatConverter, convert_to_mp4, converted_path, is_target_container};
pub use decode::VideoHandle;
pub use discovery::{
    InputSet, Traversal, VIDEO_EXTENSIONS, discover_videos, is_video_file, resolve_input,
};
pub use encode::{TARGET_CONTAINER, VideoWriter};
pub use error::VideoToolError;
pub use extract::{FrameExtractor, extract_frames, frames_dir, sampling_stride};
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use media::{FfmpegBackend, Frame, FrameSink, FrameSource, MediaBackend};
pub use merge::{DirectoryMerger, merge_videos, merged_output_path};
pub use metadata::{FALLBACK_FRAMES_PER_SECOND, SinkParameters, VideoInfo};
pub use progress::{OperationType, ProgressCallback, ProgressInfo};
pub use report::{BatchReport, Completed, FileFailure, FileOutcome, MergeReport};
