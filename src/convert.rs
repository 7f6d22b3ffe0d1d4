//! Re-encoding into MP4.
//!
//! [`FormatConverter`] decodes every frame of a source and writes it,
//! unchanged, into an MP4 file with the source's dimensions and frame rate.
//! Audio is neither read nor written. Sources that are already `.mp4` are
//! skipped, and an existing file at the output path is never overwritten.
//!
//! # Example
//!
//! ```no_run
//! use video_tool::{FormatConverter, ProcessOptions, VideoToolError};
//!
//! let report = FormatConverter::new(ProcessOptions::new().with_output_dir("converted"))
//!     .run("recordings/")?;
//! println!("{} file(s) converted", report.success_count());
//! # Ok::<(), VideoToolError>(())
//! ```

use std::path::{Path, PathBuf};

use crate::{
    config::ProcessOptions,
    discovery::{Traversal, resolve_input},
    encode::TARGET_CONTAINER,
    error::VideoToolError,
    media::{FfmpegBackend, FrameSink, FrameSource, MediaBackend},
    pipeline::{ensure_dir, pump, remove_partial_file, run_batch},
    progress::{OperationType, ProgressTracker},
    report::{BatchReport, Completed, FileOutcome},
};

/// Where the converted copy of `source` is written.
///
/// The extension is replaced by `mp4`; with `output_dir` the file goes there
/// instead of next to the source.
pub fn converted_path(source: &Path, output_dir: Option<&Path>) -> PathBuf {
    match output_dir {
        Some(dir) => {
            let name = source
                .file_name()
                .map(Path::new)
                .unwrap_or_else(|| Path::new("video"));
            dir.join(name).with_extension(TARGET_CONTAINER)
        }
        None => source.with_extension(TARGET_CONTAINER),
    }
}

/// Returns `true` if `path` already has the target container's extension.
pub fn is_target_container(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case(TARGET_CONTAINER))
}

/// Converts videos into MP4 files without audio.
#[derive(Debug, Clone)]
pub struct FormatConverter<B: MediaBackend = FfmpegBackend> {
    backend: B,
    options: ProcessOptions,
}

impl FormatConverter {
    /// Create a converter that uses FFmpeg on both ends.
    pub fn new(options: ProcessOptions) -> Self {
        Self::with_backend(FfmpegBackend, options)
    }
}

impl<B: MediaBackend> FormatConverter<B> {
    /// Create a converter that decodes and encodes with `backend`.
    pub fn with_backend(backend: B, options: ProcessOptions) -> Self {
        Self { backend, options }
    }

    /// Convert `input`, a video file or a directory of video files.
    ///
    /// Only the direct children of a directory are considered.
    ///
    /// # Errors
    ///
    /// Input resolution errors, and any error from a single-file input.
    /// Per-file errors of a directory input are collected in the report.
    pub fn run<P: AsRef<Path>>(&self, input: P) -> Result<BatchReport, VideoToolError> {
        let input = input.as_ref();
        let set = resolve_input(input, Traversal::Flat)?;
        log::info!(
            "Converting {} file(s) under {} to {}",
            set.len(),
            input.display(),
            TARGET_CONTAINER,
        );

        run_batch(OperationType::Conversion, input, &set, |path, index, count| {
            self.convert_indexed(path, index, count)
        })
    }

    /// Convert one video file.
    ///
    /// # Errors
    ///
    /// - [`VideoToolError::FileOpen`] or [`VideoToolError::NoVideoStream`]
    ///   if the file cannot be decoded. Nothing is written.
    /// - [`VideoToolError::NoReadableFrames`] if it decodes to nothing.
    /// - [`VideoToolError::OutputExists`] if the output path is already
    ///   taken. The existing file is left alone.
    /// - Decode, encode or write errors. The partial output is removed.
    pub fn convert_file<P: AsRef<Path>>(&self, path: P) -> Result<FileOutcome, VideoToolError> {
        self.convert_indexed(path.as_ref(), 0, 1)
    }

    fn convert_indexed(
        &self,
        path: &Path,
        file_index: usize,
        file_count: usize,
    ) -> Result<FileOutcome, VideoToolError> {
        if is_target_container(path) {
            log::info!(
                "{} is already {}, skipping conversion",
                path.display(),
                TARGET_CONTAINER
            );
            return Ok(FileOutcome::Skipped {
                source: path.to_path_buf(),
                reason: format!("already in {TARGET_CONTAINER} format"),
            });
        }

        let output = converted_path(path, self.options.output_dir());
        if output.exists() {
            return Err(VideoToolError::OutputExists { path: output });
        }

        let mut source = self.backend.open_source(path)?;
        let parameters = source.info().sink_parameters();
        ensure_dir(self.options.output_dir())?;

        let sink = match self.backend.create_sink(&output, parameters) {
            Ok(sink) => sink,
            Err(error) => {
                remove_partial_file(&output);
                return Err(error);
            }
        };

        let mut tracker = ProgressTracker::new(
            self.options.progress.clone(),
            OperationType::Conversion,
            path,
            file_index,
            file_count,
            self.options.batch_size,
        );
        tracker.set_total(source.info().frame_count);

        let frames = match transcode(&mut source, sink, &mut tracker, path) {
            Ok(frames) => frames,
            Err(error) => {
                remove_partial_file(&output);
                return Err(error);
            }
        };

        tracker.finish();
        log::info!(
            "Converted {} to {} ({} frames, audio dropped)",
            path.display(),
            output.display(),
            frames,
        );

        Ok(FileOutcome::Completed(Completed {
            source: path.to_path_buf(),
            outputs: vec![output],
            frames,
        }))
    }
}

/// Convert `input` with the FFmpeg backend.
///
/// Shorthand for `FormatConverter::new(options.clone()).run(input)`.
pub fn convert_to_mp4<P: AsRef<Path>>(
    input: P,
    options: &ProcessOptions,
) -> Result<BatchReport, VideoToolError> {
    FormatConverter::new(options.clone()).run(input)
}

fn transcode<S, K>(
    source: &mut S,
    mut sink: K,
    tracker: &mut ProgressTracker,
    path: &Path,
) -> Result<u64, VideoToolError>
where
    S: FrameSource,
    K: FrameSink,
{
    let stats = pump(source, &mut sink, tracker).map_err(|error| error.into_inner())?;
    if stats.frames == 0 {
        return Err(VideoToolError::NoReadableFrames {
            path: path.to_path_buf(),
        });
    }
    sink.finish()?;
    Ok(stats.frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converted_path_replaces_extension() {
        assert_eq!(
            converted_path(Path::new("videos/clip.avi"), None),
            PathBuf::from("videos/clip.mp4")
        );
        assert_eq!(
            converted_path(Path::new("videos/clip.avi"), Some(Path::new("out"))),
            PathBuf::from("out/clip.mp4")
        );
        assert_eq!(
            converted_path(Path::new("show.s01.mkv"), None),
            PathBuf::from("show.s01.mp4")
        );
    }

    #[test]
    fn target_container_check_ignores_case() {
        assert!(is_target_container(Path::new("a.mp4")));
        assert!(is_target_container(Path::new("A.MP4")));
        assert!(!is_target_container(Path::new("a.mov")));
        assert!(!is_target_container(Path::new("mp4")));
    }
}
