//! Internal timestamp and pixel-buffer helpers shared by decoding and
//! scene-detection code.

use std::time::Duration;

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy RGB24 pixel data from an FFmpeg video frame into a tightly-packed
/// buffer, collapsing any row padding the decoder added.
pub(crate) fn frame_to_rgb_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_bytes = (width as usize) * 3;
    let data = video_frame.data(0);

    if stride == row_bytes {
        data[..row_bytes * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_bytes * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
        }
        buffer
    }
}

/// Rescale a PTS value from stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Rescale a PTS value to a frame number.
pub(crate) fn pts_to_frame_number(pts: i64, time_base: Rational, frames_per_second: f64) -> u64 {
    (pts_to_seconds(pts, time_base) * frames_per_second) as u64
}

/// Convert a [`Duration`] to a timestamp in the stream's time base.
pub(crate) fn duration_to_stream_timestamp(duration: Duration, time_base: Rational) -> i64 {
    let seconds = duration.as_secs_f64();
    (seconds * time_base.denominator() as f64 / time_base.numerator() as f64) as i64
}

/// Convert a frame number to a seek timestamp in AV_TIME_BASE (microseconds).
///
/// `input_context.seek()` expects timestamps in AV_TIME_BASE (1/1_000_000)
/// when seeking without a stream index, so this bypasses the stream time
/// base entirely.
pub(crate) fn frame_number_to_seek_timestamp(frame_number: u64, frames_per_second: f64) -> i64 {
    let seconds = frame_number as f64 / frames_per_second;
    (seconds * 1_000_000.0) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pts_round_trips_through_seconds() {
        let time_base = Rational::new(1, 90_000);
        let seconds = pts_to_seconds(90_000, time_base);
        assert!((seconds - 1.0).abs() < 1e-9);
        assert_eq!(pts_to_frame_number(90_000, time_base, 25.0), 25);
    }

    #[test]
    fn duration_maps_into_stream_time_base() {
        let time_base = Rational::new(1, 1_000);
        let ts = duration_to_stream_timestamp(Duration::from_millis(2_500), time_base);
        assert_eq!(ts, 2_500);
    }

    #[test]
    fn frame_number_seek_timestamp_is_microseconds() {
        assert_eq!(frame_number_to_seek_timestamp(50, 25.0), 2_000_000);
    }
}
