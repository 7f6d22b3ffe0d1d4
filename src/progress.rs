//! Progress reporting.
//!
//! Every operation reports per-file progress through a [`ProgressCallback`]
//! configured on [`ProcessOptions`](crate::ProcessOptions). Callbacks are
//! purely observational; there is no cancellation.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use video_tool::{ProcessOptions, ProgressCallback, ProgressInfo, VideoToolError};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!(
//!             "[{:?}] file {}/{}: {} frames",
//!             info.operation,
//!             info.file_index + 1,
//!             info.file_count,
//!             info.frames_processed,
//!         );
//!     }
//! }
//!
//! let options = ProcessOptions::new().with_progress(Arc::new(PrintProgress));
//! video_tool::extract_frames("clips/", &options)?;
//! # Ok::<(), VideoToolError>(())
//! ```

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};

/// The kind of operation currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Sampling still frames from videos.
    FrameExtraction,
    /// Re-encoding videos into the target container.
    Conversion,
    /// Concatenating a directory tree into one video.
    Merging,
}

impl OperationType {
    /// A short lowercase label, used in logs and JSON output.
    pub fn label(self) -> &'static str {
        match self {
            OperationType::FrameExtraction => "extract-frames",
            OperationType::Conversion => "convert",
            OperationType::Merging => "merge",
        }
    }
}

/// A snapshot of per-file progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// The file currently being processed.
    pub path: PathBuf,
    /// Zero-based position of `path` within the invocation's file list.
    pub file_index: usize,
    /// Number of files in the invocation.
    pub file_count: usize,
    /// Frames decoded from `path` so far.
    pub frames_processed: u64,
    /// Frame count reported by the container, if any. May be approximate.
    pub frames_total: Option<u64>,
    /// Wall-clock time spent on `path` so far.
    pub elapsed: Duration,
    /// `true` on the final report for `path`.
    pub finished: bool,
}

/// Trait for receiving progress updates.
///
/// Implementations must be [`Send`] and [`Sync`] so a front end can share one
/// callback with a worker thread.
pub trait ProgressCallback: Send + Sync {
    /// Called every `batch_size` frames and once when a file is done.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. This is the default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Tracks frame counts and timing for one file and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    path: PathBuf,
    file_index: usize,
    file_count: usize,
    frames_total: Option<u64>,
    frames_processed: u64,
    batch_size: u64,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        path: &Path,
        file_index: usize,
        file_count: usize,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            operation,
            path: path.to_path_buf(),
            file_index,
            file_count,
            frames_total: None,
            frames_processed: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
        }
    }

    /// Record the container's frame count once the file is open.
    pub(crate) fn set_total(&mut self, frames_total: u64) {
        self.frames_total = (frames_total > 0).then_some(frames_total);
    }

    /// Record one decoded frame and report if the batch threshold is hit.
    pub(crate) fn advance(&mut self) {
        self.frames_processed += 1;
        if self.frames_processed % self.batch_size == 0 {
            self.report(false);
        }
    }

    /// Unconditionally emit the final report for this file.
    pub(crate) fn finish(&self) {
        self.report(true);
    }

    fn report(&self, finished: bool) {
        let info = ProgressInfo {
            operation: self.operation,
            path: self.path.clone(),
            file_index: self.file_index,
            file_count: self.file_count,
            frames_processed: self.frames_processed,
            frames_total: self.frames_total,
            elapsed: self.start_time.elapsed(),
            finished,
        };
        self.callback.on_progress(&info);
    }
}
