//! Scene extraction: one representative frame image per detected scene.
//!
//! [`SceneExtractor`] is the first of the two single-method seams the
//! summarising pipeline is built on (the other is
//! [`PdfGenerator`](crate::pdf::PdfGenerator)). Implementations detect scene
//! boundaries in a video, write one still image per scene into a scratch
//! directory, and return the image paths in scene order. Alternate detection
//! strategies plug into the [`Summarizer`](crate::summary::Summarizer)
//! without it changing.
//!
//! # Example
//!
//! ```no_run
//! use scenebook::{ContentSceneExtractor, SceneExtractor};
//! use std::path::Path;
//!
//! let extractor = ContentSceneExtractor::new().threshold(27.0);
//! let images = extractor.extract_scenes(Path::new("input.mp4"), Path::new("/tmp/scratch"))?;
//! println!("{} scene(s)", images.len());
//! # Ok::<(), scenebook::ScenebookError>(())
//! ```

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    error::ScenebookError,
    progress::{CancellationToken, NoOpProgress, ProgressCallback, ProgressInfo, Stage},
    scene::{self, CutPoint, DetectionOptions, Scene},
    source::VideoSource,
};

/// Detects scenes in a video and persists one representative frame per scene.
///
/// Contract: given a readable video and a writable scratch directory, write
/// exactly one image per detected scene into the scratch directory and
/// return the absolute paths ordered by scene index. A video with no
/// detected boundary yields `Ok(vec![])`, not an error. Filenames encode the
/// 1-based scene ordinal (`1.png`, `2.png`, …) so order survives a directory
/// listing via numeric sort.
pub trait SceneExtractor {
    /// Detect scenes in `video_path` and write frame images into
    /// `scratch_dir`.
    fn extract_scenes(
        &self,
        video_path: &Path,
        scratch_dir: &Path,
    ) -> Result<Vec<PathBuf>, ScenebookError>;
}

/// Operational settings shared by the bundled extractors.
#[derive(Clone)]
struct ExtractorRuntime {
    progress: Arc<dyn ProgressCallback>,
    cancellation: Option<CancellationToken>,
}

impl Default for ExtractorRuntime {
    fn default() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
        }
    }
}

impl ExtractorRuntime {
    fn cancel_check(&self) -> Option<impl Fn() -> bool + '_> {
        self.cancellation
            .as_ref()
            .map(|token| move || token.is_cancelled())
    }
}

/// Content-based scene extractor.
///
/// Runs a full decode through FFmpeg's `scdet` filter, which scores the
/// perceptual difference between consecutive frames; frames scoring at or
/// above the threshold become cuts. This mirrors the behaviour of
/// content-detection summarisers: sensitive to hard cuts and large visual
/// shifts, indifferent to slow pans.
#[derive(Clone, Default)]
pub struct ContentSceneExtractor {
    options: DetectionOptions,
    runtime: ExtractorRuntime,
}

impl ContentSceneExtractor {
    /// Create an extractor with default settings (threshold 27.0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the detection sensitivity. Lower values detect more cuts.
    #[must_use]
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.options.threshold = threshold;
        self
    }

    /// Replace the full detection configuration.
    #[must_use]
    pub fn with_options(mut self, options: DetectionOptions) -> Self {
        self.options = options;
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.runtime.progress = callback;
        self
    }

    /// Attach a cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.runtime.cancellation = Some(token);
        self
    }
}

impl SceneExtractor for ContentSceneExtractor {
    fn extract_scenes(
        &self,
        video_path: &Path,
        scratch_dir: &Path,
    ) -> Result<Vec<PathBuf>, ScenebookError> {
        let mut source = VideoSource::open(video_path)?;
        let check = self.runtime.cancel_check();
        let cuts = scene::detect_cuts(
            &mut source,
            &self.options,
            check.as_ref().map(|c| c as &dyn Fn() -> bool),
        )?;
        write_scene_frames(&mut source, &cuts, scratch_dir, &self.runtime)
    }
}

/// Keyframe-based scene extractor.
///
/// Treats packet-level keyframes as scene boundaries without decoding the
/// stream. Boundaries are approximate (they follow the encoder's GOP
/// structure, not visual content) but detection is orders of magnitude
/// faster, which matters on long recordings.
#[derive(Clone, Default)]
pub struct KeyframeSceneExtractor {
    options: DetectionOptions,
    runtime: ExtractorRuntime,
}

impl KeyframeSceneExtractor {
    /// Create an extractor with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the full detection configuration. The threshold field is
    /// ignored by this strategy; `max_duration` and `max_cuts` apply.
    #[must_use]
    pub fn with_options(mut self, options: DetectionOptions) -> Self {
        self.options = options;
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.runtime.progress = callback;
        self
    }

    /// Attach a cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.runtime.cancellation = Some(token);
        self
    }
}

impl SceneExtractor for KeyframeSceneExtractor {
    fn extract_scenes(
        &self,
        video_path: &Path,
        scratch_dir: &Path,
    ) -> Result<Vec<PathBuf>, ScenebookError> {
        let mut source = VideoSource::open(video_path)?;
        let check = self.runtime.cancel_check();
        let cuts = scene::detect_cuts_from_keyframes(
            &mut source,
            &self.options,
            check.as_ref().map(|c| c as &dyn Fn() -> bool),
        )?;
        write_scene_frames(&mut source, &cuts, scratch_dir, &self.runtime)
    }
}

/// Decode each scene's first frame and save it as `<ordinal>.png`.
///
/// Returns the saved paths sorted by scene ordinal. Zero cuts short-circuit
/// to an empty list without touching the scratch directory.
fn write_scene_frames(
    source: &mut VideoSource,
    cuts: &[CutPoint],
    scratch_dir: &Path,
    runtime: &ExtractorRuntime,
) -> Result<Vec<PathBuf>, ScenebookError> {
    let scenes = Scene::partition(cuts, source.metadata().duration);
    if scenes.is_empty() {
        return Ok(Vec::new());
    }

    log::info!(
        "Capturing {} representative frame(s) from {}",
        scenes.len(),
        source.file_path.display()
    );

    let total = scenes.len() as u64;
    for scene in &scenes {
        if runtime
            .cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
        {
            return Err(ScenebookError::Cancelled);
        }

        let image = source.frame(scene.start_frame)?;
        let path = scratch_dir.join(format!("{}.png", scene.index + 1));
        image.save(&path)?;

        log::debug!(
            "Saved scene {} (frame {}, {:.3}s) -> {}",
            scene.index + 1,
            scene.start_frame,
            scene.start.as_secs_f64(),
            path.display()
        );

        runtime.progress.on_progress(&ProgressInfo {
            stage: Stage::FrameExtraction,
            current: scene.index as u64 + 1,
            total: Some(total),
        });
    }

    sorted_by_scene_ordinal(scratch_dir)
}

/// List a scratch directory and order its entries by the numeric scene
/// ordinal encoded in each file stem.
///
/// Numeric sort is what keeps `10.png` after `9.png`; a lexical sort would
/// slot it between `1.png` and `2.png`. Files whose stem is not an integer
/// are ignored.
pub(crate) fn sorted_by_scene_ordinal(dir: &Path) -> Result<Vec<PathBuf>, ScenebookError> {
    let mut entries: Vec<(u64, PathBuf)> = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let ordinal = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.parse::<u64>().ok());
        if let Some(ordinal) = ordinal {
            entries.push((ordinal, path));
        }
    }

    entries.sort_unstable_by_key(|(ordinal, _)| *ordinal);
    Ok(entries.into_iter().map(|(_, path)| path).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn scratch_listing_sorts_numerically_not_lexically() {
        let dir = tempfile::tempdir().expect("tempdir");
        for ordinal in 1..=11 {
            File::create(dir.path().join(format!("{ordinal}.png"))).expect("create");
        }

        let sorted = sorted_by_scene_ordinal(dir.path()).expect("sort");
        let stems: Vec<String> = sorted
            .iter()
            .map(|p| p.file_stem().unwrap().to_string_lossy().into_owned())
            .collect();

        let expected: Vec<String> = (1..=11).map(|n| n.to_string()).collect();
        assert_eq!(stems, expected, "expected 9, 10, 11 at the end, not lexical order");
    }

    #[test]
    fn non_numeric_stems_are_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        File::create(dir.path().join("2.png")).expect("create");
        File::create(dir.path().join("1.png")).expect("create");
        File::create(dir.path().join("notes.txt")).expect("create");

        let sorted = sorted_by_scene_ordinal(dir.path()).expect("sort");
        assert_eq!(sorted.len(), 2);
        assert!(sorted[0].ends_with("1.png"));
        assert!(sorted[1].ends_with("2.png"));
    }

    #[test]
    fn empty_scratch_yields_empty_list() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sorted = sorted_by_scene_ordinal(dir.path()).expect("sort");
        assert!(sorted.is_empty());
    }
}
