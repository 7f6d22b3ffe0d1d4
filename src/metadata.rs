//! Stream metadata types.
//!
//! [`VideoInfo`] describes an open frame source and [`SinkParameters`] fixes
//! the shape of a frame sink at creation time.

use std::path::PathBuf;

/// Frame rate assumed when a container reports none.
pub const FALLBACK_FRAMES_PER_SECOND: f64 = 25.0;

/// Attributes of an open video file.
///
/// Read once when the source is opened.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoInfo {
    /// The file this source decodes.
    pub path: PathBuf,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second. Never zero; see [`FALLBACK_FRAMES_PER_SECOND`].
    pub frames_per_second: f64,
    /// Total frame count reported or estimated from the container. Can be
    /// wrong for some formats; operations never rely on it for correctness.
    pub frame_count: u64,
    /// Codec name (e.g. `"h264"`, `"mpeg4"`).
    pub codec: String,
}

impl VideoInfo {
    /// The sink shape that reproduces this source unchanged.
    pub fn sink_parameters(&self) -> SinkParameters {
        SinkParameters {
            width: self.width,
            height: self.height,
            frames_per_second: self.frames_per_second,
        }
    }
}

/// Fixed shape of a frame sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SinkParameters {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Output frame rate.
    pub frames_per_second: f64,
}

/// Replace a missing or nonsensical frame rate with the fallback.
pub(crate) fn usable_frame_rate(frames_per_second: f64) -> f64 {
    if frames_per_second.is_finite() && frames_per_second > 0.0 {
        frames_per_second
    } else {
        FALLBACK_FRAMES_PER_SECOND
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rate_falls_back_to_default() {
        assert_eq!(usable_frame_rate(29.97), 29.97);
        assert_eq!(usable_frame_rate(0.0), FALLBACK_FRAMES_PER_SECOND);
        assert_eq!(usable_frame_rate(-1.0), FALLBACK_FRAMES_PER_SECOND);
        assert_eq!(usable_frame_rate(f64::NAN), FALLBACK_FRAMES_PER_SECOND);
    }

    #[test]
    fn sink_parameters_copy_shape() {
        let info = VideoInfo {
            path: PathBuf::from("clip.mkv"),
            width: 1280,
            height: 720,
            frames_per_second: 24.0,
            frame_count: 240,
            codec: "vp9".to_string(),
        };
        let parameters = info.sink_parameters();
        assert_eq!(parameters.width, 1280);
        assert_eq!(parameters.height, 720);
        assert_eq!(parameters.frames_per_second, 24.0);
    }
}
