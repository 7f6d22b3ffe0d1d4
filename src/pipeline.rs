//! Plumbing shared by the three operations: running a closure over an
//! [`InputSet`], moving frames from a source into a sink, and removing
//! incomplete outputs.

use std::{fs, io::ErrorKind, path::Path};

use image::{RgbImage, imageops::FilterType};

use crate::{
    discovery::InputSet,
    error::VideoToolError,
    media::{FrameSink, FrameSource},
    progress::{OperationType, ProgressTracker},
    report::{BatchReport, FileFailure, FileOutcome},
};

/// Run `process` over every file of `set`, in order.
///
/// `process` receives the file, its zero-based position and the file count.
/// A single-file input returns the file's error directly; a batch input
/// records it in the report and moves on.
pub(crate) fn run_batch<F>(
    operation: OperationType,
    input: &Path,
    set: &InputSet,
    mut process: F,
) -> Result<BatchReport, VideoToolError>
where
    F: FnMut(&Path, usize, usize) -> Result<FileOutcome, VideoToolError>,
{
    let mut report = BatchReport::new(operation, input.to_path_buf());
    let file_count = set.len();

    for (file_index, path) in set.files().iter().enumerate() {
        match process(path, file_index, file_count) {
            Ok(outcome) => report.record(outcome),
            Err(error) if set.is_batch() => {
                log::warn!("{} failed for {}: {error}", operation.label(), path.display());
                report.failures.push(FileFailure {
                    path: path.clone(),
                    error,
                });
            }
            Err(error) => return Err(error),
        }
    }

    log::info!(
        "{} finished: {} succeeded, {} skipped, {} failed",
        operation.label(),
        report.success_count(),
        report.skipped.len(),
        report.failures.len(),
    );
    Ok(report)
}

/// Which side of a [`pump`] failed.
#[derive(Debug)]
pub(crate) enum PumpError {
    /// Decoding the source failed. Frames already written stay written.
    Source(VideoToolError),
    /// The sink rejected a frame. The sink is no longer usable.
    Sink(VideoToolError),
}

impl PumpError {
    pub(crate) fn into_inner(self) -> VideoToolError {
        match self {
            PumpError::Source(error) | PumpError::Sink(error) => error,
        }
    }
}

/// What a [`pump`] moved.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PumpStats {
    /// Frames decoded and written.
    pub(crate) frames: u64,
    /// At least one frame was scaled to fit the sink.
    pub(crate) resized: bool,
}

/// Write every remaining frame of `source` into `sink`, in order.
///
/// Frames whose dimensions differ from the sink's are scaled to fit.
pub(crate) fn pump<S, K>(
    source: &mut S,
    sink: &mut K,
    tracker: &mut ProgressTracker,
) -> Result<PumpStats, PumpError>
where
    S: FrameSource,
    K: FrameSink,
{
    let target = *sink.parameters();
    let mut stats = PumpStats::default();

    while let Some(frame) = source.next_frame().map_err(PumpError::Source)? {
        let (width, height) = frame.image.dimensions();
        if (width, height) == (target.width, target.height) {
            sink.write_frame(&frame.image).map_err(PumpError::Sink)?;
        } else {
            if !stats.resized {
                log::warn!(
                    "Resizing {} from {}x{} to {}x{}",
                    source.info().path.display(),
                    width,
                    height,
                    target.width,
                    target.height,
                );
                stats.resized = true;
            }
            let scaled = fit(&frame.image, target.width, target.height);
            sink.write_frame(&scaled).map_err(PumpError::Sink)?;
        }
        stats.frames += 1;
        tracker.advance();
    }

    Ok(stats)
}

/// Scale `image` to exactly `width`×`height`, ignoring aspect ratio.
pub(crate) fn fit(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    image::imageops::resize(image, width, height, FilterType::Triangle)
}

/// Best-effort removal of an output left behind by a failed operation.
pub(crate) fn remove_partial_file(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => log::debug!("Removed incomplete output {}", path.display()),
        Err(error) if error.kind() == ErrorKind::NotFound => {}
        Err(error) => log::warn!(
            "Failed to remove incomplete output {}: {error}",
            path.display()
        ),
    }
}

/// Create `dir` (and parents) if an output override points somewhere new.
pub(crate) fn ensure_dir(dir: Option<&Path>) -> Result<(), VideoToolError> {
    if let Some(dir) = dir {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    Ok(())
}
