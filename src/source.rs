//! Opening videos and decoding single frames.
//!
//! [`VideoSource`] is the entry point for everything that touches FFmpeg. It
//! opens a media file, locates the best video stream, caches
//! [`VideoMetadata`], and decodes individual frames as
//! [`image::DynamicImage`] values (seek to the nearest keyframe, decode
//! forward, convert to RGB24).
//!
//! # Example
//!
//! ```no_run
//! use scenebook::VideoSource;
//!
//! let mut source = VideoSource::open("input.mp4")?;
//! println!("{} frames at {:.2} fps", source.metadata().frame_count,
//!     source.metadata().frames_per_second);
//! let frame = source.frame(0)?;
//! frame.save("first_frame.png")?;
//! # Ok::<(), scenebook::ScenebookError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    codec::context::Context as CodecContext,
    format::Pixel,
    format::context::Input,
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, RgbImage};

use crate::{conversion, error::ScenebookError};

/// Cached properties of the best video stream, extracted once at open time.
#[derive(Debug, Clone)]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Average frames per second.
    pub frames_per_second: f64,
    /// Estimated total frame count (duration × fps).
    pub frame_count: u64,
    /// Codec name as reported by FFmpeg (e.g. `h264`).
    pub codec: String,
    /// Container-level duration.
    pub duration: Duration,
}

/// An opened video file.
///
/// Holds the FFmpeg demuxer context and cached metadata. All scene-detection
/// and frame-extraction code in this crate operates on a `VideoSource`.
pub struct VideoSource {
    pub(crate) input_context: Input,
    pub(crate) metadata: VideoMetadata,
    pub(crate) video_stream_index: usize,
    /// Kept for log and error messages.
    pub(crate) file_path: PathBuf,
}

impl Debug for VideoSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoSource")
            .field("metadata", &self.metadata)
            .field("video_stream_index", &self.video_stream_index)
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl VideoSource {
    /// Open a video file.
    ///
    /// Initialises FFmpeg (idempotent), opens the file, locates the best
    /// video stream and caches its metadata.
    ///
    /// # Errors
    ///
    /// Returns [`ScenebookError::FileOpen`] if the file cannot be opened and
    /// [`ScenebookError::NoVideoStream`] if it has no video stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ScenebookError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();

        log::debug!("Opening video file: {}", file_path.display());

        ffmpeg_next::init().map_err(|error| ScenebookError::FileOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| ScenebookError::FileOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let video_stream_index = input_context
            .streams()
            .best(Type::Video)
            .map(|stream| stream.index())
            .ok_or(ScenebookError::NoVideoStream)?;

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let stream = input_context
            .stream(video_stream_index)
            .ok_or(ScenebookError::NoVideoStream)?;

        let decoder_context =
            CodecContext::from_parameters(stream.parameters()).map_err(|error| {
                ScenebookError::FileOpen {
                    path: file_path.clone(),
                    reason: format!("Failed to read video codec parameters: {error}"),
                }
            })?;
        let video_decoder =
            decoder_context
                .decoder()
                .video()
                .map_err(|error| ScenebookError::FileOpen {
                    path: file_path.clone(),
                    reason: format!("Failed to create video decoder: {error}"),
                })?;

        let frame_rate = stream.avg_frame_rate();
        let frames_per_second = if frame_rate.denominator() != 0 {
            frame_rate.numerator() as f64 / frame_rate.denominator() as f64
        } else {
            let rate = stream.rate();
            if rate.denominator() != 0 {
                rate.numerator() as f64 / rate.denominator() as f64
            } else {
                0.0
            }
        };

        let frame_count = if frames_per_second > 0.0 {
            (duration.as_secs_f64() * frames_per_second) as u64
        } else {
            0
        };

        let codec = video_decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = VideoMetadata {
            width: video_decoder.width(),
            height: video_decoder.height(),
            frames_per_second,
            frame_count,
            codec,
            duration,
        };

        log::info!(
            "Opened {}: {}x{}, {:.2} fps, ~{} frames, codec={}, duration={:.2}s",
            file_path.display(),
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.frame_count,
            metadata.codec,
            metadata.duration.as_secs_f64(),
        );

        Ok(Self {
            input_context,
            metadata,
            video_stream_index,
            file_path,
        })
    }

    /// Cached metadata of the best video stream.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Decode the frame at `frame_number` (0-indexed) as an RGB8 image.
    ///
    /// Seeks to the nearest keyframe before the target, then decodes forward.
    /// If the exact frame index cannot be hit (variable frame rate, rounding)
    /// the first frame at or after the target is returned instead.
    ///
    /// # Errors
    ///
    /// Returns [`ScenebookError::VideoDecodeError`] if the stream cannot be
    /// decoded or the target lies past the end of the stream.
    pub fn frame(&mut self, frame_number: u64) -> Result<DynamicImage, ScenebookError> {
        let width = self.metadata.width;
        let height = self.metadata.height;
        let frames_per_second = self.metadata.frames_per_second;

        let stream = self
            .input_context
            .stream(self.video_stream_index)
            .ok_or(ScenebookError::NoVideoStream)?;
        let time_base = stream.time_base();

        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let mut decoder = decoder_context.decoder().video()?;

        let mut scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )?;

        let seek_target =
            conversion::frame_number_to_seek_timestamp(frame_number, frames_per_second);
        self.input_context.seek(seek_target, ..seek_target)?;

        let mut decoded_frame = VideoFrame::empty();
        let mut rgb_frame = VideoFrame::empty();
        let video_stream_index = self.video_stream_index;

        for (stream, packet) in self.input_context.packets() {
            if stream.index() != video_stream_index {
                continue;
            }

            decoder
                .send_packet(&packet)
                .map_err(|error| ScenebookError::VideoDecodeError(error.to_string()))?;

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                let pts = decoded_frame.pts().unwrap_or(0);
                let current =
                    conversion::pts_to_frame_number(pts, time_base, frames_per_second);

                if current >= frame_number {
                    scaler.run(&decoded_frame, &mut rgb_frame)?;
                    return frame_to_image(&rgb_frame, width, height);
                }
            }
        }

        // Drain frames still buffered in the decoder.
        let _ = decoder.send_eof();
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            let pts = decoded_frame.pts().unwrap_or(0);
            let current = conversion::pts_to_frame_number(pts, time_base, frames_per_second);

            if current >= frame_number {
                scaler.run(&decoded_frame, &mut rgb_frame)?;
                return frame_to_image(&rgb_frame, width, height);
            }
        }

        Err(ScenebookError::VideoDecodeError(format!(
            "Could not locate frame {frame_number} in {}",
            self.file_path.display()
        )))
    }
}

/// Convert a scaled RGB24 frame to an [`image::DynamicImage`].
fn frame_to_image(
    rgb_frame: &VideoFrame,
    width: u32,
    height: u32,
) -> Result<DynamicImage, ScenebookError> {
    let buffer = conversion::frame_to_rgb_buffer(rgb_frame, width, height);
    let rgb_image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        ScenebookError::VideoDecodeError(
            "Failed to construct RGB image from decoded frame data".to_string(),
        )
    })?;
    Ok(DynamicImage::ImageRgb8(rgb_image))
}
