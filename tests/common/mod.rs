//! In-memory media backend shared by the operation tests.
//!
//! Clips are registered against real (placeholder) files in a temporary
//! directory so path resolution sees them; their frames live in memory.
//! Paths that were never registered fail to open like a corrupt file would.

#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
    sync::Mutex,
};

use image::{Rgb, RgbImage};
use video_tool::{
    Frame, FrameSink, FrameSource, MediaBackend, ProgressCallback, ProgressInfo, SinkParameters,
    VideoInfo, VideoToolError,
};

/// Frames of one registered file.
#[derive(Debug, Clone)]
pub struct Clip {
    pub frames_per_second: f64,
    pub frames: Vec<RgbImage>,
    /// Decoding fails once this many frames have been produced.
    pub fail_after: Option<usize>,
}

impl Clip {
    /// `count` frames of one solid colour.
    pub fn solid(width: u32, height: u32, frames_per_second: f64, count: usize, color: [u8; 3]) -> Self {
        Self {
            frames_per_second,
            frames: vec![RgbImage::from_pixel(width, height, Rgb(color)); count],
            fail_after: None,
        }
    }

    pub fn failing_after(mut self, frames: usize) -> Self {
        self.fail_after = Some(frames);
        self
    }
}

/// What a sink received.
#[derive(Debug, Clone)]
pub struct Written {
    pub parameters: SinkParameters,
    pub frames: Vec<RgbImage>,
    pub finished: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    clips: Rc<RefCell<HashMap<PathBuf, Clip>>>,
    written: Rc<RefCell<HashMap<PathBuf, Written>>>,
    fail_sink_after: Option<u64>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sinks reject every frame after the first `frames`.
    pub fn with_failing_sink(mut self, frames: u64) -> Self {
        self.fail_sink_after = Some(frames);
        self
    }

    /// Create a placeholder file at `path` and register `clip` for it.
    pub fn add(&self, path: &Path, clip: Clip) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create clip directory");
        }
        fs::write(path, b"placeholder").expect("write placeholder");
        self.clips.borrow_mut().insert(path.to_path_buf(), clip);
    }

    /// Create a placeholder file that no clip is registered for.
    pub fn add_corrupt(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create clip directory");
        }
        fs::write(path, b"not a video").expect("write corrupt file");
    }

    pub fn written(&self, path: &Path) -> Option<Written> {
        self.written.borrow().get(path).cloned()
    }

    pub fn sink_count(&self) -> usize {
        self.written.borrow().len()
    }
}

pub struct MemorySource {
    info: VideoInfo,
    frames: Vec<RgbImage>,
    position: usize,
    fail_after: Option<usize>,
}

impl FrameSource for MemorySource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, VideoToolError> {
        if self.fail_after == Some(self.position) {
            return Err(VideoToolError::VideoDecodeError(format!(
                "corrupt packet in {}",
                self.info.path.display()
            )));
        }
        let Some(image) = self.frames.get(self.position).cloned() else {
            return Ok(None);
        };
        let index = self.position as u64;
        self.position += 1;
        Ok(Some(Frame { index, image }))
    }
}

pub struct MemorySink {
    path: PathBuf,
    parameters: SinkParameters,
    frames: Vec<RgbImage>,
    fail_after: Option<u64>,
    store: Rc<RefCell<HashMap<PathBuf, Written>>>,
}

impl MemorySink {
    fn record(&self, finished: bool) {
        self.store.borrow_mut().insert(
            self.path.clone(),
            Written {
                parameters: self.parameters,
                frames: self.frames.clone(),
                finished,
            },
        );
    }
}

impl FrameSink for MemorySink {
    fn parameters(&self) -> &SinkParameters {
        &self.parameters
    }

    fn write_frame(&mut self, image: &RgbImage) -> Result<(), VideoToolError> {
        if image.dimensions() != (self.parameters.width, self.parameters.height) {
            return Err(VideoToolError::FrameSizeMismatch {
                expected_width: self.parameters.width,
                expected_height: self.parameters.height,
                actual_width: image.width(),
                actual_height: image.height(),
            });
        }
        if self.fail_after == Some(self.frames.len() as u64) {
            return Err(VideoToolError::VideoWriteError("disk full".to_string()));
        }
        self.frames.push(image.clone());
        self.record(false);
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        self.frames.len() as u64
    }

    fn finish(self) -> Result<(), VideoToolError> {
        fs::write(&self.path, format!("{} frames", self.frames.len()))?;
        self.record(true);
        Ok(())
    }
}

impl MediaBackend for MemoryBackend {
    type Source = MemorySource;
    type Sink = MemorySink;

    fn open_source(&self, path: &Path) -> Result<MemorySource, VideoToolError> {
        let clips = self.clips.borrow();
        let clip = clips.get(path).ok_or_else(|| VideoToolError::FileOpen {
            path: path.to_path_buf(),
            reason: "Invalid data found when processing input".to_string(),
        })?;
        let (width, height) = clip
            .frames
            .first()
            .map(RgbImage::dimensions)
            .unwrap_or((64, 48));

        Ok(MemorySource {
            info: VideoInfo {
                path: path.to_path_buf(),
                width,
                height,
                frames_per_second: clip.frames_per_second,
                frame_count: clip.frames.len() as u64,
                codec: "rawvideo".to_string(),
            },
            frames: clip.frames.clone(),
            position: 0,
            fail_after: clip.fail_after,
        })
    }

    fn create_sink(
        &self,
        path: &Path,
        parameters: SinkParameters,
    ) -> Result<MemorySink, VideoToolError> {
        fs::write(path, b"")?;
        let sink = MemorySink {
            path: path.to_path_buf(),
            parameters,
            frames: Vec::new(),
            fail_after: self.fail_sink_after,
            store: self.written.clone(),
        };
        sink.record(false);
        Ok(sink)
    }
}

/// Records every progress report it receives.
#[derive(Default)]
pub struct RecordingProgress {
    pub reports: Mutex<Vec<ProgressInfo>>,
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.reports.lock().unwrap().push(info.clone());
    }
}

/// The top-left pixel of every frame, in order.
pub fn colors(frames: &[RgbImage]) -> Vec<[u8; 3]> {
    frames.iter().map(|frame| frame.get_pixel(0, 0).0).collect()
}
