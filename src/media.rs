//! Frame source and frame sink abstractions.
//!
//! The three operations are written against [`FrameSource`] and
//! [`FrameSink`] and obtain them from a [`MediaBackend`]. The default
//! backend, [`FfmpegBackend`], decodes with [`VideoHandle`] and encodes with
//! [`VideoWriter`].

use std::path::Path;

use image::RgbImage;

use crate::{
    decode::VideoHandle,
    encode::VideoWriter,
    error::VideoToolError,
    metadata::{SinkParameters, VideoInfo},
};

/// One decoded frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Zero-based position in decode order.
    pub index: u64,
    /// 8-bit RGB pixels at the source's native size.
    pub image: RgbImage,
}

/// A sequential, forward-only decoder over one video file.
///
/// Dropping the source releases the decoder.
pub trait FrameSource {
    /// Attributes read when the source was opened.
    fn info(&self) -> &VideoInfo;

    /// Decode the next frame, or `None` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<Frame>, VideoToolError>;
}

/// A sequential encoder writing frames into one output file.
///
/// Dropping a sink without calling [`finish`](FrameSink::finish) releases
/// the encoder but leaves an incomplete file behind.
pub trait FrameSink {
    /// Shape fixed when the sink was created.
    fn parameters(&self) -> &SinkParameters;

    /// Encode one frame. Its dimensions must equal the sink's.
    fn write_frame(&mut self, image: &RgbImage) -> Result<(), VideoToolError>;

    /// Number of frames accepted so far.
    fn frames_written(&self) -> u64;

    /// Flush the encoder and finalise the container.
    fn finish(self) -> Result<(), VideoToolError>
    where
        Self: Sized;
}

/// Factory for frame sources and sinks.
pub trait MediaBackend {
    /// Decoder type.
    type Source: FrameSource;
    /// Encoder type.
    type Sink: FrameSink;

    /// Open `path` for decoding.
    fn open_source(&self, path: &Path) -> Result<Self::Source, VideoToolError>;

    /// Create (or truncate) `path` for encoding.
    fn create_sink(
        &self,
        path: &Path,
        parameters: SinkParameters,
    ) -> Result<Self::Sink, VideoToolError>;
}

/// FFmpeg-backed decoding and MP4/MPEG-4 encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegBackend;

impl MediaBackend for FfmpegBackend {
    type Source = VideoHandle;
    type Sink = VideoWriter;

    fn open_source(&self, path: &Path) -> Result<VideoHandle, VideoToolError> {
        VideoHandle::open(path)
    }

    fn create_sink(
        &self,
        path: &Path,
        parameters: SinkParameters,
    ) -> Result<VideoWriter, VideoToolError> {
        VideoWriter::create(path, parameters)
    }
}
