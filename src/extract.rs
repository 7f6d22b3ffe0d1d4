//! Frame sampling.
//!
//! [`FrameExtractor`] writes roughly one still image per second of video.
//! The sampling stride is the source's frame rate rounded to the nearest
//! integer, so a 29.97 fps file is sampled every 30 frames.
//!
//! Sampled frames of `dir/clip.avi` land in `dir/clip_frames/` as
//! `clip_1.png`, `clip_2.png`, … With an output-directory override the
//! `clip_frames` directory is placed under the override instead.
//!
//! When two inputs of one directory share a stem (`clip.avi` and `clip.mkv`)
//! the extension is folded into the name: `clip_avi_frames/clip_avi_1.png`
//! and `clip_mkv_frames/clip_mkv_1.png`.
//!
//! # Example
//!
//! ```no_run
//! use video_tool::{FrameExtractor, ProcessOptions, StillFormat, VideoToolError};
//!
//! let options = ProcessOptions::new().with_still_format(StillFormat::Jpeg);
//! let report = FrameExtractor::new(options).run("holiday.mkv")?;
//! for path in report.outputs() {
//!     println!("{}", path.display());
//! }
//! # Ok::<(), VideoToolError>(())
//! ```

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
};

use image::RgbImage;

use crate::{
    config::{ProcessOptions, StillFormat},
    discovery::{Traversal, resolve_input},
    error::VideoToolError,
    media::{FfmpegBackend, FrameSource, MediaBackend},
    pipeline::{remove_partial_file, run_batch},
    progress::{OperationType, ProgressTracker},
    report::{BatchReport, Completed, FileOutcome},
};

/// Frames between two samples for a source running at `frames_per_second`.
///
/// Rounds to the nearest integer and never returns less than 1.
pub fn sampling_stride(frames_per_second: f64) -> u64 {
    if frames_per_second.is_finite() {
        (frames_per_second.round() as u64).max(1)
    } else {
        1
    }
}

/// Directory that receives the sampled frames of `source`.
pub fn frames_dir(source: &Path, output_dir: Option<&Path>) -> PathBuf {
    labelled_frames_dir(source, output_dir, &file_stem(source))
}

fn labelled_frames_dir(source: &Path, output_dir: Option<&Path>, label: &str) -> PathBuf {
    let parent = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => source.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    parent.join(format!("{label}_frames"))
}

fn file_stem(source: &Path) -> String {
    source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string())
}

/// `clip.avi` becomes `clip_avi`.
fn qualified_stem(source: &Path) -> String {
    match source.extension() {
        Some(extension) => format!("{}_{}", file_stem(source), extension.to_string_lossy()),
        None => file_stem(source),
    }
}

/// Files of `files` whose frames directory would be shared with another file.
fn colliding_stems(files: &[PathBuf], output_dir: Option<&Path>) -> HashSet<PathBuf> {
    let mut seen: HashMap<PathBuf, usize> = HashMap::new();
    for path in files {
        *seen.entry(frames_dir(path, output_dir)).or_default() += 1;
    }
    files
        .iter()
        .filter(|path| seen.get(&frames_dir(path, output_dir)).copied().unwrap_or(0) > 1)
        .cloned()
        .collect()
}

/// Samples still frames from videos.
#[derive(Debug, Clone)]
pub struct FrameExtractor<B: MediaBackend = FfmpegBackend> {
    backend: B,
    options: ProcessOptions,
}

impl FrameExtractor {
    /// Create an extractor that decodes with FFmpeg.
    pub fn new(options: ProcessOptions) -> Self {
        Self::with_backend(FfmpegBackend, options)
    }
}

impl<B: MediaBackend> FrameExtractor<B> {
    /// Create an extractor that decodes with `backend`.
    pub fn with_backend(backend: B, options: ProcessOptions) -> Self {
        Self { backend, options }
    }

    /// The options this extractor was built with.
    pub fn options(&self) -> &ProcessOptions {
        &self.options
    }

    /// Sample `input`, a video file or a directory of video files.
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
            "Extracting frames from {} file(s) under {}",
            set.len(),
            input.display()
        );

        let colliding = colliding_stems(set.files(), self.options.output_dir());
        for path in &colliding {
            log::debug!(
                "{} shares its stem with another input, naming frames {}",
                path.display(),
                qualified_stem(path)
            );
        }

        run_batch(
            OperationType::FrameExtraction,
            input,
            &set,
            |path, file_index, file_count| {
                let label = if colliding.contains(path) {
                    qualified_stem(path)
                } else {
                    file_stem(path)
                };
                self.extract_indexed(path, label, file_index, file_count)
                    .map(FileOutcome::Completed)
            },
        )
    }

    /// Sample one video file.
    ///
    /// # Errors
    ///
    /// - [`VideoToolError::FileOpen`] or [`VideoToolError::NoVideoStream`]
    ///   if the file cannot be decoded. Nothing is written.
    /// - [`VideoToolError::NoReadableFrames`] if it decodes to nothing.
    /// - Decode or image-write errors. Images already written for the file
    ///   are removed.
    pub fn extract_file<P: AsRef<Path>>(&self, path: P) -> Result<Completed, VideoToolError> {
        let path = path.as_ref();
        self.extract_indexed(path, file_stem(path), 0, 1)
    }

    fn extract_indexed(
        &self,
        path: &Path,
        label: String,
        file_index: usize,
        file_count: usize,
    ) -> Result<Completed, VideoToolError> {
        let mut source = self.backend.open_source(path)?;
        let stride = sampling_stride(source.info().frames_per_second);
        log::debug!("Sampling {} every {} frame(s)", path.display(), stride);

        let mut tracker = ProgressTracker::new(
            self.options.progress.clone(),
            OperationType::FrameExtraction,
            path,
            file_index,
            file_count,
            self.options.batch_size,
        );
        tracker.set_total(source.info().frame_count);

        let mut stills = Stills::new(
            labelled_frames_dir(path, self.options.output_dir(), &label),
            label,
            self.options.still_format,
        );

        let frames = match sample(&mut source, stride, &mut stills, &mut tracker) {
            Ok(frames) => frames,
            Err(error) => {
                stills.discard();
                return Err(error);
            }
        };
        if frames == 0 {
            return Err(VideoToolError::NoReadableFrames {
                path: path.to_path_buf(),
            });
        }

        tracker.finish();
        log::info!(
            "Saved {} frame(s) from {} to {}",
            stills.written.len(),
            path.display(),
            stills.dir.display(),
        );

        Ok(Completed {
            source: path.to_path_buf(),
            outputs: stills.written,
            frames,
        })
    }
}

/// Sample `input` with the FFmpeg backend.
///
/// Shorthand for `FrameExtractor::new(options.clone()).run(input)`.
pub fn extract_frames<P: AsRef<Path>>(
    input: P,
    options: &ProcessOptions,
) -> Result<BatchReport, VideoToolError> {
    FrameExtractor::new(options.clone()).run(input)
}

fn sample<S: FrameSource>(
    source: &mut S,
    stride: u64,
    stills: &mut Stills,
    tracker: &mut ProgressTracker,
) -> Result<u64, VideoToolError> {
    let mut position = 0u64;
    while let Some(frame) = source.next_frame()? {
        if position % stride == 0 {
            stills.save(&frame.image)?;
        }
        position += 1;
        tracker.advance();
    }
    Ok(position)
}

/// Images written for one source file.
struct Stills {
    dir: PathBuf,
    stem: String,
    format: StillFormat,
    written: Vec<PathBuf>,
    created_dir: bool,
}

impl Stills {
    fn new(dir: PathBuf, stem: String, format: StillFormat) -> Self {
        Self {
            dir,
            stem,
            format,
            written: Vec::new(),
            created_dir: false,
        }
    }

    fn save(&mut self, image: &RgbImage) -> Result<(), VideoToolError> {
        if self.written.is_empty() && !self.dir.is_dir() {
            fs::create_dir_all(&self.dir)?;
            self.created_dir = true;
        }

        let number = self.written.len() + 1;
        let path = self
            .dir
            .join(format!("{}_{number}.{}", self.stem, self.format.extension()));
        image.save_with_format(&path, self.format.to_image_format())?;
        self.written.push(path);
        Ok(())
    }

    fn discard(&mut self) {
        for path in self.written.drain(..) {
            remove_partial_file(&path);
        }
        if self.created_dir {
            if let Err(error) = fs::remove_dir(&self.dir) {
                log::warn!(
                    "Failed to remove frames directory {}: {error}",
                    self.dir.display()
                );
            }
        }
    }
}
