//! Orchestrator tests with mock pipeline stages.
//!
//! These verify the Summarizer contract (scratch lifecycle, ordering
//! handoff, terminal outcomes) without decoding any video.

use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use image::{Rgb, RgbImage};
use scenebook::{
    ImagePdfGenerator, PdfGenerator, ScenebookError, SceneExtractor, Summarizer, SummaryOutcome,
};

/// Extractor that writes `count` synthetic frame images into the scratch
/// directory and records where the scratch directory was.
struct MockExtractor {
    count: usize,
    seen_scratch: Mutex<Option<PathBuf>>,
}

impl MockExtractor {
    fn new(count: usize) -> Self {
        Self {
            count,
            seen_scratch: Mutex::new(None),
        }
    }

    fn scratch_path(&self) -> Option<PathBuf> {
        self.seen_scratch.lock().expect("lock").clone()
    }
}

impl SceneExtractor for MockExtractor {
    fn extract_scenes(
        &self,
        _video_path: &Path,
        scratch_dir: &Path,
    ) -> Result<Vec<PathBuf>, ScenebookError> {
        *self.seen_scratch.lock().expect("lock") = Some(scratch_dir.to_path_buf());

        let mut paths = Vec::with_capacity(self.count);
        for ordinal in 1..=self.count {
            let mut img = RgbImage::new(16, 12);
            for pixel in img.pixels_mut() {
                *pixel = Rgb([ordinal as u8, 0, 0]);
            }
            let path = scratch_dir.join(format!("{ordinal}.png"));
            img.save(&path)?;
            paths.push(path);
        }
        Ok(paths)
    }
}

/// Extractor that always fails, recording whether it was invoked.
struct FailingExtractor {
    invoked: Mutex<bool>,
}

impl SceneExtractor for FailingExtractor {
    fn extract_scenes(
        &self,
        _video_path: &Path,
        _scratch_dir: &Path,
    ) -> Result<Vec<PathBuf>, ScenebookError> {
        *self.invoked.lock().expect("lock") = true;
        Err(ScenebookError::VideoDecodeError("mock failure".to_string()))
    }
}

/// Generator that records the image sequence it was handed.
#[derive(Default)]
struct RecordingGenerator {
    received: Mutex<Vec<PathBuf>>,
    fail: bool,
}

impl PdfGenerator for RecordingGenerator {
    fn generate(&self, images: &[PathBuf], output_path: &Path) -> Result<(), ScenebookError> {
        *self.received.lock().expect("lock") = images.to_vec();
        if self.fail {
            return Err(ScenebookError::PdfEncodeError("mock failure".to_string()));
        }
        std::fs::write(output_path, b"%PDF-mock")?;
        Ok(())
    }
}

fn touch_input(dir: &Path) -> PathBuf {
    let input = dir.join("input.mp4");
    std::fs::write(&input, b"not really a video").expect("write input");
    input
}

#[test]
fn no_scenes_is_success_without_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = touch_input(dir.path());
    let output = dir.path().join("summary.pdf");

    let extractor = MockExtractor::new(0);
    let generator = RecordingGenerator::default();
    let outcome = Summarizer::new(extractor, generator)
        .run(&input, &output)
        .expect("zero scenes is not an error");

    assert_eq!(outcome, SummaryOutcome::NoScenes);
    assert!(!output.exists(), "no document may be written for zero scenes");
}

#[test]
fn scratch_directory_is_deleted_after_success() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = touch_input(dir.path());
    let output = dir.path().join("summary.pdf");

    let summarizer = Summarizer::new(MockExtractor::new(3), RecordingGenerator::default());
    summarizer.run(&input, &output).expect("run");

    let scratch = summarizer_scratch(&summarizer);
    assert!(scratch.is_some(), "extractor saw a scratch directory");
    assert!(
        !scratch.expect("scratch path").exists(),
        "scratch directory must be removed after the run"
    );
}

#[test]
fn scratch_directory_is_deleted_after_extraction_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = touch_input(dir.path());
    let output = dir.path().join("summary.pdf");

    let extractor = MockExtractor::new(2);
    let generator = RecordingGenerator {
        fail: true,
        ..Default::default()
    };
    let summarizer = Summarizer::new(extractor, generator);

    let result = summarizer.run(&input, &output);
    assert!(matches!(result, Err(ScenebookError::PdfEncodeError(_))));

    let scratch = summarizer_scratch(&summarizer);
    assert!(
        !scratch.expect("scratch path").exists(),
        "scratch directory must be removed on failure too"
    );
}

#[test]
fn missing_input_fails_before_any_work() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("does_not_exist.mp4");
    let output = dir.path().join("summary.pdf");

    let extractor = FailingExtractor {
        invoked: Mutex::new(false),
    };
    let summarizer = Summarizer::new(extractor, RecordingGenerator::default());

    let result = summarizer.run(&input, &output);
    assert!(matches!(result, Err(ScenebookError::InputNotFound { .. })));
    assert!(!output.exists());

    let (extractor, _) = summarizer_parts(&summarizer);
    assert!(
        !*extractor.invoked.lock().expect("lock"),
        "extraction must not start for a missing input"
    );
}

#[test]
fn generator_receives_images_in_scene_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = touch_input(dir.path());
    let output = dir.path().join("summary.pdf");

    let summarizer = Summarizer::new(MockExtractor::new(11), RecordingGenerator::default());
    let outcome = summarizer.run(&input, &output).expect("run");

    assert_eq!(
        outcome,
        SummaryOutcome::Written {
            output: output.clone(),
            pages: 11
        }
    );

    let (_, generator) = summarizer_parts(&summarizer);
    let received = generator.received.lock().expect("lock").clone();
    let stems: Vec<String> = received
        .iter()
        .map(|p| p.file_stem().expect("stem").to_string_lossy().into_owned())
        .collect();
    let expected: Vec<String> = (1..=11).map(|n| n.to_string()).collect();
    assert_eq!(stems, expected, "page order must match scene order");
}

#[test]
fn full_pipeline_with_real_generator_yields_one_page_per_scene() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = touch_input(dir.path());
    let output = dir.path().join("summary.pdf");

    let outcome = Summarizer::new(MockExtractor::new(5), ImagePdfGenerator::new())
        .run(&input, &output)
        .expect("run");

    assert!(matches!(outcome, SummaryOutcome::Written { pages: 5, .. }));
    let doc = lopdf::Document::load(&output).expect("load pdf");
    assert_eq!(doc.get_pages().len(), 5);
}

// The Summarizer owns its stages; these helpers reach back into them for
// assertions. Kept at the bottom so the tests above read top-down.

fn summarizer_scratch<G: PdfGenerator>(
    summarizer: &Summarizer<MockExtractor, G>,
) -> Option<PathBuf> {
    summarizer_parts(summarizer).0.scratch_path()
}

fn summarizer_parts<E: SceneExtractor, G: PdfGenerator>(
    summarizer: &Summarizer<E, G>,
) -> (&E, &G) {
    summarizer.parts()
}
