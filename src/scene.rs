//! Scene boundary detection.
//!
//! A *cut* is a detected discontinuity between consecutive frames; *k* cuts
//! partition a video into *k + 1* half-open scenes
//! `[0, c1), [c1, c2), …, [ck, duration)`. When no cut is detected the video
//! is treated as having no scenes at all, so callers can distinguish "nothing
//! to summarise" from "one long take".
//!
//! Two detectors are provided:
//!
//! - [`detect_cuts`] runs a full decode through FFmpeg's `scdet` filter and
//!   reads the per-frame `lavfi.scd.score` metadata it attaches.
//! - [`detect_cuts_from_keyframes`] treats packet-level keyframes as
//!   boundaries without decoding. Much faster, approximate.

use std::ffi::CStr;
use std::time::Duration;

use ffmpeg_next::{
    Error as FfmpegError, Packet, codec::context::Context as CodecContext,
    filter::Graph as FilterGraph, frame::Video as VideoFrame,
};
use ffmpeg_sys_next::AVPixelFormat;

use crate::{conversion, error::ScenebookError, source::VideoSource};

/// A detected scene cut.
#[derive(Debug, Clone)]
pub struct CutPoint {
    /// Timestamp of the cut.
    pub timestamp: Duration,
    /// Frame number at which the cut was detected.
    pub frame_number: u64,
    /// Detector confidence score (0.0–100.0). Keyframe-derived cuts report
    /// a sentinel score of 100.0.
    pub score: f64,
}

/// A half-open interval `[start, end)` between two cuts (or a cut and the
/// stream boundary).
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Zero-based scene ordinal, in chronological order.
    pub index: usize,
    /// Start timestamp (inclusive).
    pub start: Duration,
    /// End timestamp (exclusive).
    pub end: Duration,
    /// Frame number of the scene's first frame, the representative frame.
    pub start_frame: u64,
}

impl Scene {
    /// Partition a video into scenes from an ordered cut list.
    ///
    /// Returns an empty `Vec` when `cuts` is empty: a video with no detected
    /// transitions has no scenes by definition (mirrors the behaviour of
    /// content-detection tooling this crate replaces).
    pub fn partition(cuts: &[CutPoint], duration: Duration) -> Vec<Scene> {
        if cuts.is_empty() {
            return Vec::new();
        }

        let mut scenes = Vec::with_capacity(cuts.len() + 1);
        let mut start = Duration::ZERO;
        let mut start_frame = 0_u64;

        for cut in cuts {
            scenes.push(Scene {
                index: scenes.len(),
                start,
                end: cut.timestamp,
                start_frame,
            });
            start = cut.timestamp;
            start_frame = cut.frame_number;
        }

        scenes.push(Scene {
            index: scenes.len(),
            start,
            end: duration.max(start),
            start_frame,
        });

        scenes
    }
}

/// Cut detection settings.
///
/// # Example
///
/// ```
/// use scenebook::DetectionOptions;
///
/// let options = DetectionOptions::new().threshold(20.0);
/// assert_eq!(options.threshold, 20.0);
/// ```
#[derive(Debug, Clone)]
pub struct DetectionOptions {
    /// Minimum score for a frame to be considered a cut.
    ///
    /// Range 0.0–100.0. Lower values detect more (weaker) cuts. Default:
    /// 27.0, matching the sensitivity convention of content-based scene
    /// detection tools.
    pub threshold: f64,
    /// Optional maximum analysis duration from the start of the stream.
    pub max_duration: Option<Duration>,
    /// Optional cap on the number of detected cuts.
    pub max_cuts: Option<usize>,
}

/// Default detection sensitivity.
pub const DEFAULT_THRESHOLD: f64 = 27.0;

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_duration: None,
            max_cuts: None,
        }
    }
}

impl DetectionOptions {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum score required for a cut.
    #[must_use]
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Limit analysis to the first `duration` of the video.
    #[must_use]
    pub fn max_duration(mut self, duration: Duration) -> Self {
        self.max_duration = Some(duration);
        self
    }

    /// Stop after detecting at most `max_cuts` cuts.
    #[must_use]
    pub fn max_cuts(mut self, max_cuts: usize) -> Self {
        self.max_cuts = Some(max_cuts);
        self
    }
}

/// Detect cuts with a full decode through the `scdet` filter.
///
/// The filter chain is `buffer → scale → format(yuv420p) → scdet →
/// buffersink`. The `format` stage normalises mid-stream pixel-format
/// changes that would otherwise make the graph reject frames.
pub fn detect_cuts(
    source: &mut VideoSource,
    options: &DetectionOptions,
    cancel_check: Option<&dyn Fn() -> bool>,
) -> Result<Vec<CutPoint>, ScenebookError> {
    let video_stream_index = source.video_stream_index;
    let frames_per_second = source.metadata.frames_per_second;

    log::debug!(
        "Detecting cuts in {} (threshold={})",
        source.file_path.display(),
        options.threshold
    );

    let stream = source
        .input_context
        .stream(video_stream_index)
        .ok_or(ScenebookError::NoVideoStream)?;
    let time_base = stream.time_base();
    let decoder_context = CodecContext::from_parameters(stream.parameters())?;
    let mut decoder = decoder_context.decoder().video()?;

    let max_timestamp = options
        .max_duration
        .map(|duration| conversion::duration_to_stream_timestamp(duration, time_base));

    let mut cuts = Vec::new();
    let mut decoded_frame = VideoFrame::empty();
    let mut filtered_frame = VideoFrame::empty();

    // The decoder's reported pixel format before decoding can differ from
    // its real output, so probe the first frame to seed the buffer filter.
    let mut probed_pix_fmt: Option<i32> = None;

    'probe: for (stream, packet) in source.input_context.packets() {
        if stream.index() != video_stream_index {
            continue;
        }

        decoder
            .send_packet(&packet)
            .map_err(|e| ScenebookError::VideoDecodeError(e.to_string()))?;

        if decoder.receive_frame(&mut decoded_frame).is_ok() {
            probed_pix_fmt = Some(AVPixelFormat::from(decoded_frame.format()) as i32);
            break 'probe;
        }
    }

    let pix_fmt = probed_pix_fmt.unwrap_or(AVPixelFormat::from(decoder.format()) as i32);

    // Colorspace and range straight from the probed AVFrame so the buffer
    // filter matches the decoded frame properties exactly.
    let (color_space, color_range) = if probed_pix_fmt.is_some() {
        unsafe {
            let ptr = decoded_frame.as_ptr();
            ((*ptr).colorspace as i32, (*ptr).color_range as i32)
        }
    } else {
        (2, 0) // AVCOL_SPC_UNSPECIFIED, AVCOL_RANGE_UNSPECIFIED
    };

    let mut graph = FilterGraph::new();

    let buffer_args = format!(
        "video_size={}x{}:pix_fmt={}:time_base={}/{}:pixel_aspect=1/1:colorspace={}:range={}",
        decoder.width(),
        decoder.height(),
        pix_fmt,
        time_base.numerator(),
        time_base.denominator(),
        color_space,
        color_range,
    );

    graph
        .add(
            &ffmpeg_next::filter::find("buffer").ok_or_else(|| {
                ScenebookError::FilterGraphError("FFmpeg 'buffer' filter not found".to_string())
            })?,
            "in",
            &buffer_args,
        )
        .map_err(|e| ScenebookError::FilterGraphError(format!("Failed to add buffer filter: {e}")))?;

    graph
        .add(
            &ffmpeg_next::filter::find("buffersink").ok_or_else(|| {
                ScenebookError::FilterGraphError("FFmpeg 'buffersink' filter not found".to_string())
            })?,
            "out",
            "",
        )
        .map_err(|e| {
            ScenebookError::FilterGraphError(format!("Failed to add buffersink filter: {e}"))
        })?;

    let scdet_spec = format!(
        "scale=320:-1,format=pix_fmts=yuv420p,scdet=threshold={}",
        options.threshold
    );
    graph
        .output("in", 0)
        .map_err(|e| ScenebookError::FilterGraphError(format!("Graph output error: {e}")))?
        .input("out", 0)
        .map_err(|e| ScenebookError::FilterGraphError(format!("Graph input error: {e}")))?
        .parse(&scdet_spec)
        .map_err(|e| ScenebookError::FilterGraphError(format!("Graph parse error: {e}")))?;

    graph
        .validate()
        .map_err(|e| ScenebookError::FilterGraphError(format!("Graph validation: {e}")))?;

    // Feed one decoded frame through the graph and collect any cuts that
    // fall out of the sink.
    let mut feed_and_collect = |graph: &mut FilterGraph,
                                frame: &VideoFrame,
                                cuts: &mut Vec<CutPoint>|
     -> Result<(), ScenebookError> {
        graph
            .get("in")
            .ok_or_else(|| ScenebookError::FilterGraphError("Filter 'in' not found".to_string()))?
            .source()
            .add(frame)
            .map_err(|e| ScenebookError::FilterGraphError(format!("Failed to feed filter: {e}")))?;

        while graph
            .get("out")
            .ok_or_else(|| {
                ScenebookError::FilterGraphError("Filter 'out' not found".to_string())
            })?
            .sink()
            .frame(&mut filtered_frame)
            .is_ok()
        {
            let score = read_scdet_score(&filtered_frame);
            if let Some(score) = score.filter(|&s| s >= options.threshold) {
                let pts = filtered_frame.pts().unwrap_or(0);
                cuts.push(CutPoint {
                    timestamp: Duration::from_secs_f64(
                        conversion::pts_to_seconds(pts, time_base).max(0.0),
                    ),
                    frame_number: conversion::pts_to_frame_number(
                        pts,
                        time_base,
                        frames_per_second,
                    ),
                    score,
                });

                if options.max_cuts.is_some_and(|max| cuts.len() >= max) {
                    return Ok(());
                }
            }
        }
        Ok(())
    };

    // The probe already decoded the first frame (and possibly buffered more).
    if probed_pix_fmt.is_some() {
        feed_and_collect(&mut graph, &decoded_frame, &mut cuts)?;
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            feed_and_collect(&mut graph, &decoded_frame, &mut cuts)?;
        }
    }

    for (stream, packet) in source.input_context.packets() {
        if let Some(check) = cancel_check
            && check()
        {
            return Err(ScenebookError::Cancelled);
        }

        if stream.index() != video_stream_index {
            continue;
        }

        if let Some(max_pts) = max_timestamp
            && packet.pts().is_some_and(|pts| pts > max_pts)
        {
            break;
        }

        decoder
            .send_packet(&packet)
            .map_err(|e| ScenebookError::VideoDecodeError(e.to_string()))?;

        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            if let Some(max_pts) = max_timestamp
                && decoded_frame.pts().is_some_and(|pts| pts > max_pts)
            {
                return Ok(cuts);
            }
            feed_and_collect(&mut graph, &decoded_frame, &mut cuts)?;
        }

        if options.max_cuts.is_some_and(|max| cuts.len() >= max) {
            return Ok(cuts);
        }
    }

    // Flush the decoder.
    let _ = decoder.send_eof();
    while decoder.receive_frame(&mut decoded_frame).is_ok() {
        if let Some(max_pts) = max_timestamp
            && decoded_frame.pts().is_some_and(|pts| pts > max_pts)
        {
            break;
        }
        let _ = feed_and_collect(&mut graph, &decoded_frame, &mut cuts);
    }

    // Drain remaining filter output.
    while graph
        .get("out")
        .map(|mut f| f.sink().frame(&mut filtered_frame).is_ok())
        .unwrap_or(false)
    {
        let score = read_scdet_score(&filtered_frame);
        if let Some(score) = score.filter(|&s| s >= options.threshold) {
            let pts = filtered_frame.pts().unwrap_or(0);
            cuts.push(CutPoint {
                timestamp: Duration::from_secs_f64(
                    conversion::pts_to_seconds(pts, time_base).max(0.0),
                ),
                frame_number: conversion::pts_to_frame_number(pts, time_base, frames_per_second),
                score,
            });

            if options.max_cuts.is_some_and(|max| cuts.len() >= max) {
                break;
            }
        }
    }

    log::info!(
        "Detected {} cut(s) in {}",
        cuts.len(),
        source.file_path.display()
    );

    Ok(cuts)
}

/// Detect cuts from packet-level keyframes only, without decoding.
///
/// Suitable for long videos where approximate boundaries are acceptable.
/// The very first key packet is the start-of-stream marker and is skipped.
pub fn detect_cuts_from_keyframes(
    source: &mut VideoSource,
    options: &DetectionOptions,
    cancel_check: Option<&dyn Fn() -> bool>,
) -> Result<Vec<CutPoint>, ScenebookError> {
    let video_stream_index = source.video_stream_index;
    let frames_per_second = source.metadata.frames_per_second;

    let time_base = source
        .input_context
        .stream(video_stream_index)
        .ok_or(ScenebookError::NoVideoStream)?
        .time_base();

    let max_stream_timestamp = options
        .max_duration
        .map(|duration| conversion::duration_to_stream_timestamp(duration, time_base));

    let mut cuts = Vec::new();
    let mut video_packet_number: u64 = 0;
    let mut packet = Packet::empty();

    loop {
        if let Some(check) = cancel_check
            && check()
        {
            return Err(ScenebookError::Cancelled);
        }

        match packet.read(&mut source.input_context) {
            Ok(()) => {
                if packet.stream() as usize != video_stream_index {
                    continue;
                }

                if let Some(max_pts) = max_stream_timestamp
                    && packet.pts().is_some_and(|pts| pts > max_pts)
                {
                    break;
                }

                if packet.is_key() && video_packet_number > 0 {
                    let pts = packet.pts().unwrap_or(0);
                    cuts.push(CutPoint {
                        timestamp: Duration::from_secs_f64(
                            conversion::pts_to_seconds(pts, time_base).max(0.0),
                        ),
                        frame_number: conversion::pts_to_frame_number(
                            pts,
                            time_base,
                            frames_per_second,
                        ),
                        score: 100.0,
                    });

                    if options.max_cuts.is_some_and(|max| cuts.len() >= max) {
                        break;
                    }
                }

                video_packet_number += 1;
            }
            Err(FfmpegError::Eof) => break,
            Err(error) => return Err(ScenebookError::from(error)),
        }
    }

    log::info!(
        "Detected {} keyframe boundary cut(s) in {}",
        cuts.len(),
        source.file_path.display()
    );

    Ok(cuts)
}

/// Read the `lavfi.scd.score` metadata entry from a filtered frame.
///
/// The `scdet` filter adds this key to frames where it detects a scene
/// change. Returns `None` for frames without the key.
fn read_scdet_score(frame: &VideoFrame) -> Option<f64> {
    // SAFETY: the frame's metadata dictionary is only reachable through
    // ffmpeg_sys_next; ffmpeg-next's safe API does not expose it.
    unsafe {
        let frame_ptr = frame.as_ptr();
        if frame_ptr.is_null() {
            return None;
        }

        let metadata = (*frame_ptr).metadata;
        if metadata.is_null() {
            return None;
        }

        let key = c"lavfi.scd.score";
        let entry = ffmpeg_sys_next::av_dict_get(metadata, key.as_ptr(), std::ptr::null(), 0);
        if entry.is_null() {
            return None;
        }

        let value_ptr = (*entry).value;
        if value_ptr.is_null() {
            return None;
        }

        CStr::from_ptr(value_ptr).to_str().ok()?.parse::<f64>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cut(seconds: u64, frame: u64) -> CutPoint {
        CutPoint {
            timestamp: Duration::from_secs(seconds),
            frame_number: frame,
            score: 50.0,
        }
    }

    #[test]
    fn no_cuts_means_no_scenes() {
        assert!(Scene::partition(&[], Duration::from_secs(60)).is_empty());
    }

    #[test]
    fn cuts_partition_into_half_open_scenes() {
        let cuts = vec![cut(10, 250), cut(25, 625)];
        let scenes = Scene::partition(&cuts, Duration::from_secs(60));

        assert_eq!(scenes.len(), 3);
        assert_eq!(scenes[0].start, Duration::ZERO);
        assert_eq!(scenes[0].end, Duration::from_secs(10));
        assert_eq!(scenes[0].start_frame, 0);
        assert_eq!(scenes[1].start, Duration::from_secs(10));
        assert_eq!(scenes[1].end, Duration::from_secs(25));
        assert_eq!(scenes[1].start_frame, 250);
        assert_eq!(scenes[2].start, Duration::from_secs(25));
        assert_eq!(scenes[2].end, Duration::from_secs(60));
        assert_eq!(scenes[2].start_frame, 625);
    }

    #[test]
    fn scene_indices_are_chronological() {
        let cuts = vec![cut(5, 125), cut(8, 200), cut(30, 750)];
        let scenes = Scene::partition(&cuts, Duration::from_secs(45));
        let indices: Vec<usize> = scenes.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn final_scene_end_never_precedes_its_start() {
        // Container duration can under-report; end is clamped to start.
        let cuts = vec![cut(50, 1250)];
        let scenes = Scene::partition(&cuts, Duration::from_secs(40));
        assert_eq!(scenes[1].end, scenes[1].start);
    }

    #[test]
    fn detection_options_builder() {
        let options = DetectionOptions::new()
            .threshold(12.5)
            .max_duration(Duration::from_secs(30))
            .max_cuts(8);
        assert_eq!(options.threshold, 12.5);
        assert_eq!(options.max_duration, Some(Duration::from_secs(30)));
        assert_eq!(options.max_cuts, Some(8));
    }

    #[test]
    fn default_threshold_matches_convention() {
        assert_eq!(DetectionOptions::default().threshold, DEFAULT_THRESHOLD);
    }
}
