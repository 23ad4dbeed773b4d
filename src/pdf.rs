//! PDF assembly: one page per frame image.
//!
//! [`PdfGenerator`] is the second single-method seam of the pipeline.
//! [`ImagePdfGenerator`] implements it on top of the `printpdf` crate: each
//! input image becomes one page sized to the image's native pixel dimensions
//! at a fixed DPI, so aspect ratio and resolution are preserved exactly.
//!
//! # Example
//!
//! ```no_run
//! use scenebook::{ImagePdfGenerator, PdfGenerator};
//! use std::path::{Path, PathBuf};
//!
//! let images = vec![PathBuf::from("/tmp/scratch/1.png"), PathBuf::from("/tmp/scratch/2.png")];
//! ImagePdfGenerator::new().generate(&images, Path::new("summary.pdf"))?;
//! # Ok::<(), scenebook::ScenebookError>(())
//! ```

use std::{
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use printpdf::{Image, ImageTransform, Mm, PdfDocument, image_crate};
use tempfile::NamedTempFile;

use crate::error::ScenebookError;

const MM_PER_INCH: f32 = 25.4;

/// Packs an ordered image sequence into a single multi-page document.
///
/// Contract: page *i* contains image *i* at native resolution and aspect,
/// input order preserved exactly. An empty input sequence performs no write
/// and returns `Ok(())`; absence of scenes is a valid terminal state, not a
/// defect. On any encoding failure no output file may be left behind.
pub trait PdfGenerator {
    /// Assemble `images` into a document at `output_path`.
    fn generate(&self, images: &[PathBuf], output_path: &Path) -> Result<(), ScenebookError>;
}

/// `printpdf`-backed document generator.
///
/// Writes to a temporary file in the destination directory and renames it
/// into place only after the document saved cleanly, so a failed run never
/// leaves a truncated PDF that looks like a success.
#[derive(Debug, Clone)]
pub struct ImagePdfGenerator {
    /// Resolution used to map image pixels to physical page size.
    dpi: f32,
}

impl Default for ImagePdfGenerator {
    fn default() -> Self {
        Self { dpi: 96.0 }
    }
}

impl ImagePdfGenerator {
    /// Create a generator with the default 96 DPI page mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the DPI used to size pages from image pixels. Higher DPI yields
    /// physically smaller pages for the same image.
    #[must_use]
    pub fn with_dpi(mut self, dpi: f32) -> Self {
        self.dpi = dpi.max(1.0);
        self
    }

    fn page_size_mm(&self, width_px: u32, height_px: u32) -> (Mm, Mm) {
        (
            Mm(width_px as f32 * MM_PER_INCH / self.dpi),
            Mm(height_px as f32 * MM_PER_INCH / self.dpi),
        )
    }
}

impl PdfGenerator for ImagePdfGenerator {
    fn generate(&self, images: &[PathBuf], output_path: &Path) -> Result<(), ScenebookError> {
        if images.is_empty() {
            log::debug!("No images to assemble; skipping PDF generation");
            return Ok(());
        }

        log::info!(
            "Assembling {} page(s) into {}",
            images.len(),
            output_path.display()
        );

        // printpdf bundles its own `image` version, so decoding goes through
        // its re-export rather than the crate-level `image` dependency.
        let mut decoded = Vec::with_capacity(images.len());
        for path in images {
            let reader = image_crate::io::Reader::open(path).map_err(|error| {
                ScenebookError::PdfEncodeError(format!(
                    "Failed to open page image {}: {error}",
                    path.display()
                ))
            })?;
            let image = reader.decode().map_err(|error| {
                ScenebookError::PdfEncodeError(format!(
                    "Failed to decode page image {}: {error}",
                    path.display()
                ))
            })?;
            decoded.push(image);
        }

        let (first_width, first_height) = (decoded[0].width(), decoded[0].height());
        let (page_width, page_height) = self.page_size_mm(first_width, first_height);
        let (doc, first_page, first_layer) =
            PdfDocument::new("Scene summary", page_width, page_height, "scene");

        for (index, image) in decoded.iter().enumerate() {
            let (page, layer) = if index == 0 {
                (first_page, first_layer)
            } else {
                let (width, height) = self.page_size_mm(image.width(), image.height());
                doc.add_page(width, height, "scene")
            };

            let pdf_image = Image::from_dynamic_image(image);
            pdf_image.add_to_layer(
                doc.get_page(page).get_layer(layer),
                ImageTransform {
                    dpi: Some(self.dpi),
                    ..Default::default()
                },
            );
        }

        // Render next to the destination, rename into place on success.
        let parent = match output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let staging = NamedTempFile::new_in(parent)?;

        let mut writer = BufWriter::new(staging.as_file());
        doc.save(&mut writer)
            .map_err(|error| ScenebookError::PdfEncodeError(error.to_string()))?;
        writer.flush()?;
        drop(writer);

        staging
            .persist(output_path)
            .map_err(|error| ScenebookError::IoError(error.error))?;

        log::info!("Wrote {}", output_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_scales_with_dpi() {
        let generator = ImagePdfGenerator::new().with_dpi(254.0);
        let (width, height) = generator.page_size_mm(254, 508);
        assert!((width.0 - 25.4).abs() < 1e-3);
        assert!((height.0 - 50.8).abs() < 1e-3);
    }

    #[test]
    fn dpi_is_clamped_positive() {
        let generator = ImagePdfGenerator::new().with_dpi(-10.0);
        let (width, _) = generator.page_size_mm(100, 100);
        assert!(width.0.is_finite());
    }
}
