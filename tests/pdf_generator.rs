//! PDF generator integration tests.
//!
//! These run without any video fixture: page images are synthesised with the
//! `image` crate and the finished documents are inspected with `lopdf`.

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use scenebook::{ImagePdfGenerator, PdfGenerator, ScenebookError};

fn write_test_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let mut img = RgbImage::new(width, height);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        *pixel = Rgb([(x % 256) as u8, (y % 256) as u8, 128]);
    }
    let path = dir.join(name);
    img.save(&path).expect("save test image");
    path
}

#[test]
fn one_page_per_image() {
    let dir = tempfile::tempdir().expect("tempdir");
    let images: Vec<PathBuf> = (1..=3)
        .map(|i| write_test_image(dir.path(), &format!("{i}.png"), 64, 48))
        .collect();
    let output = dir.path().join("summary.pdf");

    ImagePdfGenerator::new()
        .generate(&images, &output)
        .expect("generate");

    assert!(output.exists());
    let doc = lopdf::Document::load(&output).expect("load pdf");
    assert_eq!(doc.get_pages().len(), 3);
}

#[test]
fn output_starts_with_pdf_magic() {
    let dir = tempfile::tempdir().expect("tempdir");
    let images = vec![write_test_image(dir.path(), "1.png", 32, 32)];
    let output = dir.path().join("out.pdf");

    ImagePdfGenerator::new()
        .generate(&images, &output)
        .expect("generate");

    let bytes = std::fs::read(&output).expect("read pdf");
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn empty_input_writes_nothing_and_succeeds() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = dir.path().join("empty.pdf");

    ImagePdfGenerator::new()
        .generate(&[], &output)
        .expect("empty input is a no-op, not a failure");

    assert!(!output.exists());
}

#[test]
fn unreadable_image_fails_without_leaving_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let images = vec![dir.path().join("missing.png")];
    let output = dir.path().join("broken.pdf");

    let result = ImagePdfGenerator::new().generate(&images, &output);

    assert!(matches!(result, Err(ScenebookError::PdfEncodeError(_))));
    assert!(!output.exists(), "a failed run must not leave an output file");
}

#[test]
fn page_sizes_follow_input_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let images = vec![
        write_test_image(dir.path(), "1.png", 100, 80),
        write_test_image(dir.path(), "2.png", 200, 160),
        write_test_image(dir.path(), "3.png", 50, 40),
    ];
    let output = dir.path().join("ordered.pdf");

    ImagePdfGenerator::new()
        .generate(&images, &output)
        .expect("generate");

    // At 96 DPI a pixel maps to 0.75pt, so the MediaBox widths recover the
    // original image order: 75, 150, 37.5.
    let doc = lopdf::Document::load(&output).expect("load pdf");
    let mut widths = Vec::new();
    for (_, page_id) in doc.get_pages() {
        let page = doc.get_dictionary(page_id).expect("page dict");
        let media_box = page.get(b"MediaBox").expect("media box");
        let values = media_box.as_array().expect("media box array");
        widths.push(object_as_f32(&values[2]));
    }

    assert_eq!(widths.len(), 3);
    assert!((widths[0] - 75.0).abs() < 0.5, "got {widths:?}");
    assert!((widths[1] - 150.0).abs() < 0.5, "got {widths:?}");
    assert!((widths[2] - 37.5).abs() < 0.5, "got {widths:?}");
}

#[test]
fn repeated_runs_produce_same_page_count() {
    let dir = tempfile::tempdir().expect("tempdir");
    let images: Vec<PathBuf> = (1..=4)
        .map(|i| write_test_image(dir.path(), &format!("{i}.png"), 40, 30))
        .collect();
    let first = dir.path().join("a.pdf");
    let second = dir.path().join("b.pdf");

    let generator = ImagePdfGenerator::new();
    generator.generate(&images, &first).expect("first run");
    generator.generate(&images, &second).expect("second run");

    let pages_a = lopdf::Document::load(&first).expect("load a").get_pages().len();
    let pages_b = lopdf::Document::load(&second).expect("load b").get_pages().len();
    assert_eq!(pages_a, pages_b);
    assert_eq!(pages_a, 4);
}

fn object_as_f32(object: &lopdf::Object) -> f32 {
    match object {
        lopdf::Object::Integer(value) => *value as f32,
        lopdf::Object::Real(value) => *value,
        other => panic!("unexpected MediaBox entry: {other:?}"),
    }
}
