//! FFmpeg frame sink: MP4 container, MPEG-4 Part 2 video, no audio.
//!
//! [`VideoWriter`] is the single output format of the crate. Its shape
//! (dimensions and frame rate) is fixed when it is created; frames are then
//! encoded one at a time and the container is finalised by
//! [`finish`](crate::FrameSink::finish).
//!
//! # Example
//!
//! ```no_run
//! use image::RgbImage;
//! use video_tool::{FrameSink, SinkParameters, VideoToolError, VideoWriter};
//!
//! let parameters = SinkParameters { width: 320, height: 240, frames_per_second: 30.0 };
//! let mut writer = VideoWriter::create("output.mp4", parameters)?;
//! for value in 0..30u8 {
//!     writer.write_frame(&RgbImage::from_pixel(320, 240, image::Rgb([value, value, value])))?;
//! }
//! writer.finish()?;
//! # Ok::<(), VideoToolError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

use ffmpeg_next::{
    Packet, Rational,
    codec::{Id, context::Context as CodecContext},
    encoder::video::Encoder as VideoEncoder,
    format::{Flags as FormatFlags, Pixel, context::Output},
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;

use crate::{
    error::VideoToolError,
    media::FrameSink,
    metadata::{SinkParameters, usable_frame_rate},
};

/// Container written by every sink.
pub const TARGET_CONTAINER: &str = "mp4";

/// MPEG-4 Part 2 rejects time bases with a denominator above this.
const MAX_TIME_BASE_DENOMINATOR: i32 = 65_535;

/// Average bits spent per pixel per frame when picking a bit rate.
const BITS_PER_PIXEL: f64 = 0.15;

/// Lower bound for the computed bit rate, in bits per second.
const MIN_BIT_RATE: f64 = 400_000.0;

/// An open MP4 encoding session.
pub struct VideoWriter {
    output: Output,
    encoder: VideoEncoder,
    scaler: ScalingContext,
    rgb_frame: VideoFrame,
    parameters: SinkParameters,
    path: PathBuf,
    stream_index: usize,
    encoder_time_base: Rational,
    stream_time_base: Rational,
    frames_written: u64,
}

impl Debug for VideoWriter {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoWriter")
            .field("path", &self.path)
            .field("parameters", &self.parameters)
            .field("frames_written", &self.frames_written)
            .finish_non_exhaustive()
    }
}

impl VideoWriter {
    /// Create `path` and open an MPEG-4 encoder with the given shape.
    ///
    /// An existing file at `path` is truncated.
    ///
    /// # Errors
    ///
    /// - [`VideoToolError::VideoWriteError`] if the container cannot be
    ///   created or its header written.
    /// - [`VideoToolError::VideoEncodeError`] if the encoder is unavailable
    ///   or rejects the parameters.
    pub fn create<P: AsRef<Path>>(
        path: P,
        parameters: SinkParameters,
    ) -> Result<Self, VideoToolError> {
        let path = path.as_ref();
        crate::ffmpeg::init()?;

        let SinkParameters { width, height, .. } = parameters;
        if width == 0 || height == 0 {
            return Err(VideoToolError::VideoEncodeError(format!(
                "invalid output resolution {width}x{height}"
            )));
        }

        let frame_rate = encoder_frame_rate(parameters.frames_per_second);
        let encoder_time_base = frame_rate.invert();

        log::debug!(
            "Creating {} ({}x{} @ {}/{} fps)",
            path.display(),
            width,
            height,
            frame_rate.numerator(),
            frame_rate.denominator(),
        );

        let mut output = ffmpeg_next::format::output_as(&path, TARGET_CONTAINER).map_err(|e| {
            VideoToolError::VideoWriteError(format!("cannot create {}: {e}", path.display()))
        })?;

        // Read before adding the stream; the stream borrows the output.
        let needs_global_header = output.format().flags().contains(FormatFlags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(Id::MPEG4).ok_or_else(|| {
            VideoToolError::VideoEncodeError("MPEG-4 encoder not available".to_string())
        })?;

        let mut stream = output
            .add_stream(codec)
            .map_err(|e| VideoToolError::VideoWriteError(format!("cannot add stream: {e}")))?;
        let stream_index = stream.index();

        let mut encoder = CodecContext::from_parameters(stream.parameters())
            .map_err(|e| {
                VideoToolError::VideoEncodeError(format!("cannot create codec context: {e}"))
            })?
            .encoder()
            .video()
            .map_err(|e| {
                VideoToolError::VideoEncodeError(format!("cannot open video encoder: {e}"))
            })?;

        encoder.set_width(width);
        encoder.set_height(height);
        encoder.set_format(Pixel::YUV420P);
        encoder.set_time_base(encoder_time_base);
        encoder.set_frame_rate(Some(frame_rate));
        encoder.set_bit_rate(bit_rate(&parameters));

        if needs_global_header {
            unsafe {
                (*encoder.as_mut_ptr()).flags |=
                    ffmpeg_sys_next::AV_CODEC_FLAG_GLOBAL_HEADER as i32;
            }
        }

        let encoder = encoder
            .open_as(codec)
            .map_err(|e| VideoToolError::VideoEncodeError(format!("cannot open encoder: {e}")))?;
        stream.set_parameters(&encoder);

        output
            .write_header()
            .map_err(|e| VideoToolError::VideoWriteError(format!("cannot write header: {e}")))?;

        // The muxer may pick its own time base while writing the header.
        let stream_time_base = output
            .stream(stream_index)
            .map(|stream| stream.time_base())
            .ok_or_else(|| {
                VideoToolError::VideoWriteError("output stream disappeared".to_string())
            })?;

        let scaler = ScalingContext::get(
            Pixel::RGB24,
            width,
            height,
            Pixel::YUV420P,
            width,
            height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|e| VideoToolError::VideoWriteError(format!("cannot create scaler: {e}")))?;

        Ok(Self {
            output,
            encoder,
            scaler,
            rgb_frame: VideoFrame::new(Pixel::RGB24, width, height),
            parameters,
            path: path.to_path_buf(),
            stream_index,
            encoder_time_base,
            stream_time_base,
            frames_written: 0,
        })
    }

    /// The file being written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Move every packet the encoder has ready into the container.
    fn drain_packets(&mut self) -> Result<(), VideoToolError> {
        let mut packet = Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.encoder_time_base, self.stream_time_base);
            packet.write_interleaved(&mut self.output).map_err(|e| {
                VideoToolError::VideoWriteError(format!("write packet failed: {e}"))
            })?;
        }
        Ok(())
    }
}

impl FrameSink for VideoWriter {
    fn parameters(&self) -> &SinkParameters {
        &self.parameters
    }

    fn write_frame(&mut self, image: &RgbImage) -> Result<(), VideoToolError> {
        let (width, height) = image.dimensions();
        if width != self.parameters.width || height != self.parameters.height {
            return Err(VideoToolError::FrameSizeMismatch {
                expected_width: self.parameters.width,
                expected_height: self.parameters.height,
                actual_width: width,
                actual_height: height,
            });
        }

        crate::utilities::image_to_frame(image, &mut self.rgb_frame);

        // A fresh destination frame each time: the encoder may still hold a
        // reference to the previous one.
        let mut yuv_frame = VideoFrame::empty();
        self.scaler
            .run(&self.rgb_frame, &mut yuv_frame)
            .map_err(|e| VideoToolError::VideoWriteError(format!("scaling failed: {e}")))?;
        yuv_frame.set_pts(Some(self.frames_written as i64));

        self.encoder
            .send_frame(&yuv_frame)
            .map_err(|e| VideoToolError::VideoEncodeError(format!("send_frame failed: {e}")))?;
        self.frames_written += 1;

        self.drain_packets()
    }

    fn frames_written(&self) -> u64 {
        self.frames_written
    }

    fn finish(mut self) -> Result<(), VideoToolError> {
        self.encoder
            .send_eof()
            .map_err(|e| VideoToolError::VideoEncodeError(format!("send_eof failed: {e}")))?;
        self.drain_packets()?;

        self.output
            .write_trailer()
            .map_err(|e| VideoToolError::VideoWriteError(format!("cannot write trailer: {e}")))?;

        log::debug!(
            "Finalised {} ({} frames)",
            self.path.display(),
            self.frames_written
        );
        Ok(())
    }
}

/// Exact source rate where the encoder allows it, nearest legal rate otherwise.
fn encoder_frame_rate(frames_per_second: f64) -> Rational {
    let rate = Rational::from(usable_frame_rate(frames_per_second));
    match rate.reduce_with_limit(MAX_TIME_BASE_DENOMINATOR) {
        Ok(rate) | Err(rate) => rate,
    }
}

fn bit_rate(parameters: &SinkParameters) -> usize {
    let pixels_per_second = f64::from(parameters.width)
        * f64::from(parameters.height)
        * usable_frame_rate(parameters.frames_per_second);
    (pixels_per_second * BITS_PER_PIXEL).max(MIN_BIT_RATE) as usize
}
