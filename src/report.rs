//! Operation outcomes.
//!
//! Extract and convert return a [`BatchReport`]; merge returns a
//! [`MergeReport`]. A report that carries failures is a partial success: the
//! invocation ran, but some files could not be processed.
//!
//! # Example
//!
//! ```no_run
//! use video_tool::{ProcessOptions, VideoToolError};
//!
//! let report = video_tool::convert_to_mp4("clips/", &ProcessOptions::new())?;
//! print!("{report}");
//! if !report.is_success() {
//!     for failure in &report.failures {
//!         eprintln!("{}: {}", failure.path.display(), failure.error);
//!     }
//! }
//! # Ok::<(), VideoToolError>(())
//! ```

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
};

use crate::{error::VideoToolError, progress::OperationType};

/// One source file processed to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
    /// The source file.
    pub source: PathBuf,
    /// Files written for it: sampled images, or one converted video.
    pub outputs: Vec<PathBuf>,
    /// Frames decoded from the source.
    pub frames: u64,
}

/// Result of processing one file that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// The file was processed and its outputs written.
    Completed(Completed),
    /// The file needed no work.
    Skipped {
        /// The source file.
        source: PathBuf,
        /// Why it was left alone.
        reason: String,
    },
}

/// A file that could not be processed.
#[derive(Debug)]
pub struct FileFailure {
    /// The source file.
    pub path: PathBuf,
    /// What went wrong.
    pub error: VideoToolError,
}

/// Outcome of an extract or convert invocation.
#[derive(Debug)]
pub struct BatchReport {
    /// Which operation produced this report.
    pub operation: OperationType,
    /// The input path the operation was given.
    pub input: PathBuf,
    /// Files processed successfully, in processing order.
    pub completed: Vec<Completed>,
    /// Files left alone, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
    /// Files that failed, in processing order.
    pub failures: Vec<FileFailure>,
}

impl BatchReport {
    pub(crate) fn new(operation: OperationType, input: PathBuf) -> Self {
        Self {
            operation,
            input,
            completed: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Completed(completed) => self.completed.push(completed),
            FileOutcome::Skipped { source, reason } => self.skipped.push((source, reason)),
        }
    }

    /// Number of files processed successfully.
    pub fn success_count(&self) -> usize {
        self.completed.len()
    }

    /// Every output file written, in order.
    pub fn outputs(&self) -> impl Iterator<Item = &PathBuf> {
        self.completed
            .iter()
            .flat_map(|completed| completed.outputs.iter())
    }

    /// Returns `true` if no file failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Display for BatchReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for completed in &self.completed {
            writeln!(
                f,
                "[OK] {} ({} frames, {} output file(s))",
                completed.source.display(),
                completed.frames,
                completed.outputs.len(),
            )?;
        }
        for (source, reason) in &self.skipped {
            writeln!(f, "[SKIP] {}: {reason}", source.display())?;
        }
        for failure in &self.failures {
            writeln!(f, "[FAIL] {}: {}", failure.path.display(), failure.error)?;
        }
        writeln!(
            f,
            "{}: {} succeeded, {} skipped, {} failed",
            self.operation.label(),
            self.success_count(),
            self.skipped.len(),
            self.failures.len(),
        )
    }
}

/// Outcome of a merge invocation.
#[derive(Debug)]
pub struct MergeReport {
    /// The merged video.
    pub output: PathBuf,
    /// Frames written to `output`.
    pub frames_written: u64,
    /// Files whose frames made it into `output`, in order.
    pub merged: Vec<PathBuf>,
    /// Files whose frames were scaled to the output's dimensions.
    pub resized: Vec<PathBuf>,
    /// Files skipped because they could not be opened or decoded.
    pub failures: Vec<FileFailure>,
}

impl MergeReport {
    /// Returns `true` if every discovered file was merged.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Display for MergeReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for path in &self.merged {
            writeln!(f, "[OK] {}", path.display())?;
        }
        for path in &self.resized {
            writeln!(f, "[RESIZED] {}", path.display())?;
        }
        for failure in &self.failures {
            writeln!(f, "[FAIL] {}: {}", failure.path.display(), failure.error)?;
        }
        writeln!(
            f,
            "merge: {} file(s), {} frames -> {}",
            self.merged.len(),
            self.frames_written,
            self.output.display(),
        )
    }
}
