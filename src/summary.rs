//! Pipeline orchestration.
//!
//! [`Summarizer`] wires a [`SceneExtractor`] and a [`PdfGenerator`] together:
//! it checks the input, acquires a scratch directory, runs extraction then
//! assembly, and guarantees scratch cleanup on every exit path. The scratch
//! directory is a [`tempfile::TempDir`], so deletion happens in `Drop`;
//! normal return, error return, and unwind all release it.
//!
//! # Example
//!
//! ```no_run
//! use scenebook::{ContentSceneExtractor, ImagePdfGenerator, Summarizer, SummaryOutcome};
//! use std::path::Path;
//!
//! let summarizer = Summarizer::new(
//!     ContentSceneExtractor::new().threshold(27.0),
//!     ImagePdfGenerator::new(),
//! );
//! match summarizer.run(Path::new("input.mp4"), Path::new("input_summary.pdf"))? {
//!     SummaryOutcome::Written { output, pages } => {
//!         println!("{pages} page(s) -> {}", output.display());
//!     }
//!     SummaryOutcome::NoScenes => println!("no scene transitions detected"),
//! }
//! # Ok::<(), scenebook::ScenebookError>(())
//! ```

use std::path::{Path, PathBuf};

use crate::{error::ScenebookError, extract::SceneExtractor, pdf::PdfGenerator};

/// Terminal state of a summarising run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    /// No scene boundary was detected; no document was written. This is a
    /// successful outcome, not a failure.
    NoScenes,
    /// The document was written.
    Written {
        /// Path of the finished document.
        output: PathBuf,
        /// Number of pages, equal to the number of detected scenes.
        pages: usize,
    },
}

/// Runs the extract-then-assemble pipeline over injected stage
/// implementations.
///
/// Both stages are polymorphic over their single-method traits, so alternate
/// detection strategies or document backends swap in without touching the
/// orchestration.
#[derive(Debug, Clone)]
pub struct Summarizer<E, G> {
    extractor: E,
    generator: G,
}

impl<E, G> Summarizer<E, G>
where
    E: SceneExtractor,
    G: PdfGenerator,
{
    /// Create a summarizer from stage implementations.
    pub fn new(extractor: E, generator: G) -> Self {
        Self {
            extractor,
            generator,
        }
    }

    /// Borrow the injected stage implementations.
    pub fn parts(&self) -> (&E, &G) {
        (&self.extractor, &self.generator)
    }

    /// Summarise `input` into a PDF at `output`.
    ///
    /// The input must exist before any work begins: a missing input fails
    /// immediately without creating a scratch directory. The scratch
    /// directory holding intermediate frame images is deleted before this
    /// method returns, on success and on failure alike.
    ///
    /// # Errors
    ///
    /// - [`ScenebookError::InputNotFound`] if `input` does not exist.
    /// - Any extraction or generation error, with the scratch directory
    ///   already cleaned up.
    pub fn run(&self, input: &Path, output: &Path) -> Result<SummaryOutcome, ScenebookError> {
        if !input.exists() {
            return Err(ScenebookError::InputNotFound {
                path: input.to_path_buf(),
            });
        }

        let scratch = tempfile::Builder::new()
            .prefix("scenebook-")
            .tempdir()?;
        log::debug!("Scratch directory: {}", scratch.path().display());

        let outcome = self.run_stages(input, output, scratch.path());

        // Drop would also delete it; closing explicitly logs cleanup
        // failures without masking a stage error.
        log::debug!("Removing scratch directory");
        if let Err(error) = scratch.close() {
            log::warn!("Failed to remove scratch directory: {error}");
        }

        outcome
    }

    fn run_stages(
        &self,
        input: &Path,
        output: &Path,
        scratch: &Path,
    ) -> Result<SummaryOutcome, ScenebookError> {
        let images = self.extractor.extract_scenes(input, scratch).map_err(|error| {
            log::error!("Scene extraction failed for {}: {error}", input.display());
            error
        })?;

        if images.is_empty() {
            log::warn!(
                "No scene transitions detected in {}; nothing to write",
                input.display()
            );
            return Ok(SummaryOutcome::NoScenes);
        }

        log::info!("{} scene(s) found in {}", images.len(), input.display());

        self.generator.generate(&images, output).map_err(|error| {
            log::error!("PDF assembly failed for {}: {error}", input.display());
            error
        })?;

        Ok(SummaryOutcome::Written {
            output: output.to_path_buf(),
            pages: images.len(),
        })
    }
}

/// Derive the default output path for an input video: `<stem>_summary.pdf`
/// next to the input file.
///
/// ```
/// use scenebook::default_output_path;
/// use std::path::Path;
///
/// let output = default_output_path(Path::new("clips/holiday.mp4"));
/// assert_eq!(output, Path::new("clips/holiday_summary.pdf"));
/// ```
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    input.with_file_name(format!("{stem}_summary.pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_sits_beside_input() {
        let output = default_output_path(Path::new("/videos/talk.mkv"));
        assert_eq!(output, Path::new("/videos/talk_summary.pdf"));
    }

    #[test]
    fn default_output_handles_bare_filename() {
        let output = default_output_path(Path::new("talk.mp4"));
        assert_eq!(output, Path::new("talk_summary.pdf"));
    }

    #[test]
    fn default_output_handles_dotted_stems() {
        let output = default_output_path(Path::new("a.b.mp4"));
        assert_eq!(output, Path::new("a.b_summary.pdf"));
    }
}
