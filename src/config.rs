//! Operation options.
//!
//! [`ProcessOptions`] is a builder that threads the output location, the
//! still-image format, and progress reporting through the three operations
//! without widening every function signature.
//!
//! # Example
//!
//! ```no_run
//! use video_tool::{ProcessOptions, StillFormat};
//!
//! let options = ProcessOptions::new()
//!     .with_output_dir("out")
//!     .with_still_format(StillFormat::Jpeg)
//!     .with_batch_size(30);
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use image::ImageFormat;

use crate::progress::{NoOpProgress, ProgressCallback};

/// Image format used for sampled frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StillFormat {
    /// Lossless PNG. This is the default.
    #[default]
    Png,
    /// Baseline JPEG.
    Jpeg,
    /// Uncompressed Windows bitmap.
    Bmp,
}

impl StillFormat {
    /// File extension written for this format, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            StillFormat::Png => "png",
            StillFormat::Jpeg => "jpg",
            StillFormat::Bmp => "bmp",
        }
    }

    pub(crate) fn to_image_format(self) -> ImageFormat {
        match self {
            StillFormat::Png => ImageFormat::Png,
            StillFormat::Jpeg => ImageFormat::Jpeg,
            StillFormat::Bmp => ImageFormat::Bmp,
        }
    }
}

impl FromStr for StillFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Ok(StillFormat::Png),
            "jpg" | "jpeg" => Ok(StillFormat::Jpeg),
            "bmp" => Ok(StillFormat::Bmp),
            other => Err(format!("unsupported image format: {other}")),
        }
    }
}

/// Options shared by the extract, convert and merge operations.
///
/// A default-constructed value writes outputs next to their sources, samples
/// frames as PNG, and reports no progress.
#[derive(Clone)]
pub struct ProcessOptions {
    /// Directory that receives outputs instead of the source's directory.
    pub(crate) output_dir: Option<PathBuf>,
    /// Format for sampled frames.
    pub(crate) still_format: StillFormat,
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// Fire the progress callback every N frames.
    pub(crate) batch_size: u64,
}

impl Debug for ProcessOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ProcessOptions")
            .field("output_dir", &self.output_dir)
            .field("still_format", &self.still_format)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            output_dir: None,
            still_format: StillFormat::default(),
            progress: Arc::new(NoOpProgress),
            batch_size: 1,
        }
    }

    /// Write outputs under `dir` instead of next to each source.
    #[must_use]
    pub fn with_output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Set the image format for sampled frames.
    #[must_use]
    pub fn with_still_format(mut self, format: StillFormat) -> Self {
        self.still_format = format;
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Set how often the progress callback fires, in frames.
    ///
    /// Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// The output-directory override, if any.
    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    /// The still-image format for sampled frames.
    pub fn still_format(&self) -> StillFormat {
        self.still_format
    }
}
