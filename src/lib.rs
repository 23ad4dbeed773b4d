//! # scenebook
//!
//! Turn a video into a paginated PDF of scene snapshots: one page per
//! detected scene change, in chronological order.
//!
//! The pipeline has three stages: a [`SceneExtractor`] detects scene
//! boundaries (powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate) and saves one
//! representative frame per scene into a scratch directory; a
//! [`PdfGenerator`] packs the ordered frame images into a single document;
//! and a [`Summarizer`] wires the two together with guaranteed scratch
//! cleanup. Both stages are traits, so detection strategies and document
//! backends are swappable.
//!
//! ## Quick Start
//!
//! ```no_run
//! use scenebook::{ContentSceneExtractor, ImagePdfGenerator, Summarizer, SummaryOutcome};
//! use std::path::Path;
//!
//! let summarizer = Summarizer::new(
//!     ContentSceneExtractor::new().threshold(27.0),
//!     ImagePdfGenerator::new(),
//! );
//!
//! match summarizer.run(Path::new("lecture.mp4"), Path::new("lecture_summary.pdf"))? {
//!     SummaryOutcome::Written { output, pages } => {
//!         println!("wrote {pages} page(s) to {}", output.display());
//!     }
//!     SummaryOutcome::NoScenes => {
//!         println!("no scene transitions detected");
//!     }
//! }
//! # Ok::<(), scenebook::ScenebookError>(())
//! ```
//!
//! ## Detection strategies
//!
//! - [`ContentSceneExtractor`]: full decode through FFmpeg's `scdet`
//!   filter; scores perceptual difference between consecutive frames. The
//!   threshold (default 27.0) controls sensitivity, lower detects more cuts.
//! - [`KeyframeSceneExtractor`]: packet-level keyframe boundaries, no
//!   decode; fast and approximate.
//!
//! A video with no detected scene transition yields
//! [`SummaryOutcome::NoScenes`] and no output file, a valid terminal state
//! rather than an error.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on the system; the `scdet`
//! filter ships with stock FFmpeg builds.

pub mod error;
pub mod extract;
pub mod ffmpeg;
pub mod pdf;
pub mod progress;
pub mod scene;
pub mod source;
pub mod summary;

mod conversion;

pub use error::ScenebookError;
pub use extract::{ContentSceneExtractor, KeyframeSceneExtractor, SceneExtractor};
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use pdf::{ImagePdfGenerator, PdfGenerator};
pub use progress::{CancellationToken, ProgressCallback, ProgressInfo, Stage};
pub use scene::{CutPoint, DEFAULT_THRESHOLD, DetectionOptions, Scene};
pub use source::{VideoMetadata, VideoSource};
pub use summary::{Summarizer, SummaryOutcome, default_output_path};
