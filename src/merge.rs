//! Directory concatenation.
//!
//! [`DirectoryMerger`] walks a directory tree, decodes every video it finds
//! in discovery order and appends all their frames to one MP4. The output
//! takes the dimensions and frame rate of the first file; frames of other
//! sizes are scaled to fit.
//!
//! Files that cannot be opened or decoded after the first are skipped and
//! listed in the [`MergeReport`]. The merged output lives in the root as
//! `<root-name>_merged.mp4` and is never picked up as an input.
//!
//! # Example
//!
//! ```no_run
//! use video_tool::{DirectoryMerger, ProcessOptions, VideoToolError};
//!
//! let report = DirectoryMerger::new(ProcessOptions::new()).run("trip/")?;
//! println!("{} frames -> {}", report.frames_written, report.output.display());
//! # Ok::<(), VideoToolError>(())
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    config::ProcessOptions,
    discovery::{Traversal, discover_videos},
    encode::TARGET_CONTAINER,
    error::VideoToolError,
    media::{FfmpegBackend, FrameSink, FrameSource, MediaBackend},
    pipeline::{PumpError, ensure_dir, pump, remove_partial_file},
    progress::{OperationType, ProgressTracker},
    report::{FileFailure, MergeReport},
};

/// Where the merge of `root` is written.
///
/// `<root>/<root-name>_merged.mp4`, or the same file name under
/// `output_dir`.
pub fn merged_output_path(root: &Path, output_dir: Option<&Path>) -> PathBuf {
    let file_name = format!("{}_merged.{TARGET_CONTAINER}", root_name(root));
    output_dir.unwrap_or(root).join(file_name)
}

fn root_name(root: &Path) -> String {
    root.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .or_else(|| {
            fs::canonicalize(root)
                .ok()
                .and_then(|path| path.file_name().map(|name| name.to_string_lossy().into_owned()))
        })
        .unwrap_or_else(|| "video".to_string())
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Concatenates every video under a directory into one MP4.
#[derive(Debug, Clone)]
pub struct DirectoryMerger<B: MediaBackend = FfmpegBackend> {
    backend: B,
    options: ProcessOptions,
}

impl DirectoryMerger {
    /// Create a merger that uses FFmpeg on both ends.
    pub fn new(options: ProcessOptions) -> Self {
        Self::with_backend(FfmpegBackend, options)
    }
}

impl<B: MediaBackend> DirectoryMerger<B> {
    /// Create a merger that decodes and encodes with `backend`.
    pub fn with_backend(backend: B, options: ProcessOptions) -> Self {
        Self { backend, options }
    }

    /// Merge every video found anywhere under `root`.
    ///
    /// # Errors
    ///
    /// - [`VideoToolError::InputNotFound`] / [`VideoToolError::NotADirectory`]
    ///   if `root` is missing or not a directory.
    /// - [`VideoToolError::NoInputFound`] if the tree holds no videos. No
    ///   output is created.
    /// - Any error opening the first file, or creating the output.
    /// - Encode or write errors. The incomplete output is removed.
    /// - [`VideoToolError::NoReadableFrames`] if no file produced a frame.
    pub fn run<P: AsRef<Path>>(&self, root: P) -> Result<MergeReport, VideoToolError> {
        let root = root.as_ref();
        if !root.exists() {
            return Err(VideoToolError::InputNotFound {
                path: root.to_path_buf(),
            });
        }
        if !root.is_dir() {
            return Err(VideoToolError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        let output = merged_output_path(root, self.options.output_dir());
        let files: Vec<PathBuf> = discover_videos(root, Traversal::Recursive)?
            .into_iter()
            .filter(|path| !same_file(path, &output))
            .collect();
        let Some(first) = files.first() else {
            return Err(VideoToolError::NoInputFound {
                path: root.to_path_buf(),
            });
        };
        log::info!(
            "Merging {} file(s) under {} into {}",
            files.len(),
            root.display(),
            output.display(),
        );

        let first_source = self.backend.open_source(first)?;
        let parameters = first_source.info().sink_parameters();
        ensure_dir(self.options.output_dir())?;

        let mut sink = match self.backend.create_sink(&output, parameters) {
            Ok(sink) => sink,
            Err(error) => {
                remove_partial_file(&output);
                return Err(error);
            }
        };

        let mut report = MergeReport {
            output: output.clone(),
            frames_written: 0,
            merged: Vec::new(),
            resized: Vec::new(),
            failures: Vec::new(),
        };

        if let Err(error) = self.append_all(&files, first_source, &mut sink, &mut report) {
            drop(sink);
            remove_partial_file(&output);
            return Err(error);
        }

        report.frames_written = sink.frames_written();
        if report.frames_written == 0 {
            drop(sink);
            remove_partial_file(&output);
            return Err(VideoToolError::NoReadableFrames {
                path: root.to_path_buf(),
            });
        }

        if let Err(error) = sink.finish() {
            remove_partial_file(&output);
            return Err(error);
        }

        log::info!(
            "Merged {} file(s) into {} ({} frames, {} skipped)",
            report.merged.len(),
            output.display(),
            report.frames_written,
            report.failures.len(),
        );
        Ok(report)
    }

    /// Append every file to `sink`. Only sink failures are returned; source
    /// failures are recorded in `report`.
    fn append_all(
        &self,
        files: &[PathBuf],
        first_source: B::Source,
        sink: &mut B::Sink,
        report: &mut MergeReport,
    ) -> Result<(), VideoToolError> {
        let file_count = files.len();
        let mut first_source = Some(first_source);

        for (file_index, path) in files.iter().enumerate() {
            let opened = match first_source.take() {
                Some(source) => Ok(source),
                None => self.backend.open_source(path),
            };
            let mut source = match opened {
                Ok(source) => source,
                Err(error) => {
                    log::warn!("Skipping {}: {error}", path.display());
                    report.failures.push(FileFailure {
                        path: path.clone(),
                        error,
                    });
                    continue;
                }
            };

            let mut tracker = ProgressTracker::new(
                self.options.progress.clone(),
                OperationType::Merging,
                path,
                file_index,
                file_count,
                self.options.batch_size,
            );
            tracker.set_total(source.info().frame_count);

            match pump(&mut source, sink, &mut tracker) {
                Ok(stats) => {
                    tracker.finish();
                    log::debug!("Appended {} frames from {}", stats.frames, path.display());
                    report.merged.push(path.clone());
                    if stats.resized {
                        report.resized.push(path.clone());
                    }
                }
                Err(PumpError::Source(error)) => {
                    log::warn!("Stopped reading {}: {error}", path.display());
                    report.failures.push(FileFailure {
                        path: path.clone(),
                        error,
                    });
                }
                Err(PumpError::Sink(error)) => return Err(error),
            }
        }

        Ok(())
    }
}

/// Merge the tree under `root` with the FFmpeg backend.
///
/// Shorthand for `DirectoryMerger::new(options.clone()).run(root)`.
pub fn merge_videos<P: AsRef<Path>>(
    root: P,
    options: &ProcessOptions,
) -> Result<MergeReport, VideoToolError> {
    DirectoryMerger::new(options.clone()).run(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_named_after_the_root() {
        assert_eq!(
            merged_output_path(Path::new("videos/trip"), None),
            PathBuf::from("videos/trip/trip_merged.mp4")
        );
        assert_eq!(
            merged_output_path(Path::new("videos/trip"), Some(Path::new("out"))),
            PathBuf::from("out/trip_merged.mp4")
        );
    }

    #[test]
    fn current_directory_resolves_to_a_real_name() {
        let output = merged_output_path(Path::new("."), None);
        let name = output.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("_merged.mp4"));
        assert_ne!(name, "._merged.mp4");
    }
}
