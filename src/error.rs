//! Error types for the `scenebook` crate.
//!
//! This module defines [`ScenebookError`], the unified error type returned by
//! all fallible operations in the crate. Variants carry enough context (file
//! paths, upstream messages) to diagnose a failed run from the error alone.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `scenebook` operations.
///
/// Every public method that can fail returns `Result<T, ScenebookError>`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScenebookError {
    /// The input video path does not exist or is not a file.
    #[error("Input file not found: {path}")]
    InputNotFound {
        /// The path that was checked.
        path: PathBuf,
    },

    /// The media file could not be opened by FFmpeg.
    #[error("Failed to open video file {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::VideoSource::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in input")]
    NoVideoStream,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// FFmpeg filter graph setup or processing failed during scene detection.
    #[error("Filter graph error: {0}")]
    FilterGraphError(String),

    /// The PDF document could not be assembled or written.
    ///
    /// When this is returned no output file is left behind: the generator
    /// writes to a temporary file and only renames it into place on success.
    #[error("Failed to assemble PDF: {0}")]
    PdfEncodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while saving a representative frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The operation was cancelled via a
    /// [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<FfmpegError> for ScenebookError {
    fn from(error: FfmpegError) -> Self {
        ScenebookError::FfmpegError(error.to_string())
    }
}
