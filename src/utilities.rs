//! Pixel copying between FFmpeg frames and tightly packed buffers.

use ffmpeg_next::frame::Video as VideoFrame;
use image::RgbImage;

/// Copy plane 0 of an FFmpeg frame into a tightly packed buffer.
///
/// FFmpeg rows frequently carry padding (stride > width × bytes per pixel);
/// the padding is stripped so the result can go straight into
/// [`image::ImageBuffer::from_raw`].
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    copy_rows(
        video_frame.data(0),
        video_frame.stride(0),
        width as usize * bytes_per_pixel,
        height as usize,
    )
}

/// Copy an RGB image into plane 0 of an `RGB24` FFmpeg frame of equal size.
pub(crate) fn image_to_frame(image: &RgbImage, video_frame: &mut VideoFrame) {
    let row_len = image.width() as usize * 3;
    let stride = video_frame.stride(0);
    let destination = video_frame.data_mut(0);
    for (row, source) in image.as_raw().chunks_exact(row_len).enumerate() {
        let start = row * stride;
        destination[start..start + row_len].copy_from_slice(source);
    }
}

fn copy_rows(data: &[u8], stride: usize, row_len: usize, rows: usize) -> Vec<u8> {
    if stride == row_len {
        return data[..row_len * rows].to_vec();
    }
    let mut buffer = Vec::with_capacity(row_len * rows);
    for row in 0..rows {
        let start = row * stride;
        buffer.extend_from_slice(&data[start..start + row_len]);
    }
    buffer
}

#[cfg(test)]
mod tests {
    use super::copy_rows;

    #[test]
    fn strips_row_padding() {
        // 2 rows of 3 bytes, padded to a stride of 4.
        let data = [1, 2, 3, 0, 4, 5, 6, 0];
        assert_eq!(copy_rows(&data, 4, 3, 2), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn unpadded_planes_copy_whole() {
        let data = [1, 2, 3, 4, 5, 6, 7];
        assert_eq!(copy_rows(&data, 3, 3, 2), vec![1, 2, 3, 4, 5, 6]);
    }
}
