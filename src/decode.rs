//! FFmpeg frame source.
//!
//! [`VideoHandle`] opens a file, picks the best video stream, and decodes it
//! front to back into RGB frames at the stream's native resolution. Frames
//! are produced one at a time; nothing is buffered beyond what the decoder
//! itself holds.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::Path,
};

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;

use crate::{
    error::VideoToolError,
    media::{Frame, FrameSource},
    metadata::{VideoInfo, usable_frame_rate},
};

/// Consecutive demuxer read errors tolerated before the stream is treated as
/// ended.
const MAX_CONSECUTIVE_READ_ERRORS: u32 = 64;

/// An open decoding session for one video file.
///
/// # Example
///
/// ```no_run
/// use video_tool::{FrameSource, VideoHandle, VideoToolError};
///
/// let mut handle = VideoHandle::open("input.avi")?;
/// println!("{:.2} fps", handle.info().frames_per_second);
/// while let Some(frame) = handle.next_frame()? {
///     println!("frame {} is {}x{}", frame.index, frame.image.width(), frame.image.height());
/// }
/// # Ok::<(), VideoToolError>(())
/// ```
pub struct VideoHandle {
    input_context: Input,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    stream_index: usize,
    info: VideoInfo,
    decoded_frame: VideoFrame,
    rgb_frame: VideoFrame,
    next_index: u64,
    skipped_packets: u64,
    consecutive_read_errors: u32,
    eof_sent: bool,
    done: bool,
}

impl Debug for VideoHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoHandle")
            .field("info", &self.info)
            .field("stream_index", &self.stream_index)
            .field("next_index", &self.next_index)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl VideoHandle {
    /// Open a video file for sequential decoding.
    ///
    /// # Errors
    ///
    /// - [`VideoToolError::FileOpen`] if the container or decoder cannot be
    ///   opened, or the resolution cannot be determined.
    /// - [`VideoToolError::NoVideoStream`] if the file has no video stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, VideoToolError> {
        let path = path.as_ref();
        let open_error = |reason: String| VideoToolError::FileOpen {
            path: path.to_path_buf(),
            reason,
        };

        log::debug!("Opening video file: {}", path.display());
        crate::ffmpeg::init()?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| open_error(error.to_string()))?;

        let stream = input_context.streams().best(Type::Video).ok_or_else(|| {
            VideoToolError::NoVideoStream {
                path: path.to_path_buf(),
            }
        })?;
        let stream_index = stream.index();

        let decoder_context = CodecContext::from_parameters(stream.parameters())
            .map_err(|error| open_error(format!("cannot read codec parameters: {error}")))?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| open_error(format!("cannot create video decoder: {error}")))?;

        let width = decoder.width();
        let height = decoder.height();
        if width == 0 || height == 0 {
            return Err(open_error("cannot determine resolution".to_string()));
        }

        // Average frame rate first, then the stream's nominal rate.
        let average = stream.avg_frame_rate();
        let nominal = stream.rate();
        let reported = if average.denominator() != 0 && average.numerator() > 0 {
            f64::from(average)
        } else if nominal.denominator() != 0 {
            f64::from(nominal)
        } else {
            0.0
        };
        let frames_per_second = usable_frame_rate(reported);

        let frame_count = match stream.frames() {
            frames if frames > 0 => frames as u64,
            _ => {
                let duration_microseconds = input_context.duration().max(0) as f64;
                (duration_microseconds / 1_000_000.0 * frames_per_second) as u64
            }
        };

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|error| open_error(format!("cannot create scaler: {error}")))?;

        let info = VideoInfo {
            path: path.to_path_buf(),
            width,
            height,
            frames_per_second,
            frame_count,
            codec,
        };

        log::debug!(
            "Video stream {}: {}x{}, {:.3} fps, codec={}, ~{} frames",
            stream_index,
            info.width,
            info.height,
            info.frames_per_second,
            info.codec,
            info.frame_count,
        );

        Ok(Self {
            input_context,
            decoder,
            scaler,
            stream_index,
            info,
            decoded_frame: VideoFrame::empty(),
            rgb_frame: VideoFrame::empty(),
            next_index: 0,
            skipped_packets: 0,
            consecutive_read_errors: 0,
            eof_sent: false,
            done: false,
        })
    }

    /// Packets the decoder rejected so far.
    pub fn skipped_packets(&self) -> u64 {
        self.skipped_packets
    }

    /// Convert `decoded_frame` to an RGB image at the handle's dimensions.
    fn convert_current_frame(&mut self) -> Result<RgbImage, VideoToolError> {
        let width = self.info.width;
        let height = self.info.height;

        // Mid-stream resolution or format changes are scaled back to the
        // dimensions reported at open time.
        let input = self.scaler.input();
        if input.width != self.decoded_frame.width()
            || input.height != self.decoded_frame.height()
            || input.format != self.decoded_frame.format()
        {
            log::debug!(
                "{}: decoded frame changed to {}x{}, rescaling to {}x{}",
                self.info.path.display(),
                self.decoded_frame.width(),
                self.decoded_frame.height(),
                width,
                height,
            );
            self.scaler = ScalingContext::get(
                self.decoded_frame.format(),
                self.decoded_frame.width(),
                self.decoded_frame.height(),
                Pixel::RGB24,
                width,
                height,
                ScalingFlags::BILINEAR,
            )?;
        }

        self.scaler.run(&self.decoded_frame, &mut self.rgb_frame)?;

        let buffer = crate::utilities::frame_to_buffer(&self.rgb_frame, width, height, 3);
        RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
            VideoToolError::VideoDecodeError(
                "Failed to construct RGB image from decoded frame data".to_string(),
            )
        })
    }

    fn send_eof(&mut self) -> Result<(), VideoToolError> {
        if let Err(error) = self.decoder.send_eof() {
            self.done = true;
            return Err(VideoToolError::VideoDecodeError(format!(
                "cannot flush decoder: {error}"
            )));
        }
        self.eof_sent = true;
        Ok(())
    }

    fn finish_stream(&mut self) {
        self.done = true;
        if self.skipped_packets > 0 {
            log::warn!(
                "{}: skipped {} undecodable packet(s)",
                self.info.path.display(),
                self.skipped_packets,
            );
        }
    }
}

impl FrameSource for VideoHandle {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, VideoToolError> {
        if self.done {
            return Ok(None);
        }

        loop {
            // Drain frames the decoder already holds.
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                let image = match self.convert_current_frame() {
                    Ok(image) => image,
                    Err(error) => {
                        self.done = true;
                        return Err(error);
                    }
                };
                let index = self.next_index;
                self.next_index += 1;
                return Ok(Some(Frame { index, image }));
            }

            if self.eof_sent {
                self.finish_stream();
                return Ok(None);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    self.consecutive_read_errors = 0;
                    if packet.stream() == self.stream_index {
                        if let Err(error) = self.decoder.send_packet(&packet) {
                            self.skipped_packets += 1;
                            log::debug!(
                                "{}: decoder rejected packet: {error}",
                                self.info.path.display()
                            );
                        }
                    }
                }
                Err(FfmpegError::Eof) => self.send_eof()?,
                Err(error) => {
                    self.consecutive_read_errors += 1;
                    if self.consecutive_read_errors >= MAX_CONSECUTIVE_READ_ERRORS {
                        log::warn!(
                            "{}: giving up after repeated read errors ({error})",
                            self.info.path.display()
                        );
                        self.send_eof()?;
                    }
                }
            }
        }
    }
}
