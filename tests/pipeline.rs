use image::{GrayImage, Luma, Rgb, RgbImage};
use pixrle::pipeline::{self, PipelineConfig, DECODED_DIR, ENCODED_DIR, RAW_DIR};
use pixrle::report::{Report, HEADER};
use pixrle::{Corruption, Error};
use std::fs;
use std::path::Path;

fn striped(path: &Path) {
    // 8x4, each row a flat colour
    RgbImage::from_fn(8, 4, |_, y| Rgb([y as u8 * 40, 0, 255]))
        .save(path)
        .unwrap();
}

#[test]
fn test_batch_over_images_and_raw_streams() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    striped(&input.path().join("stripes.png"));
    GrayImage::from_pixel(4, 4, Luma([7]))
        .save(input.path().join("flat.png"))
        .unwrap();
    fs::write(input.path().join("stream.raw"), [1u8, 1, 1, 1, 2, 2, 3]).unwrap();

    let config = PipelineConfig::new(input.path(), output.path()).with_jobs(2);
    let outcome = pipeline::run(&config).unwrap();
    assert!(outcome.is_clean(), "{:?}", outcome.failures);
    assert_eq!(outcome.report.rows.len(), 3);
    for row in &outcome.report.rows {
        assert_eq!(row.record.fidelity, 1.0, "{}", row.filename);
    }

    let raw = fs::read(output.path().join(RAW_DIR).join("stripes.raw")).unwrap();
    assert_eq!(raw.len(), 8 * 4 * 3);
    assert_eq!(&raw[..6], &[0, 0, 255, 0, 0, 255]);
    let decoded = fs::read(output.path().join(DECODED_DIR).join("stripes_decoded.raw")).unwrap();
    assert_eq!(decoded, raw);

    // 48 identical bytes in one run
    let flat = outcome
        .report
        .rows
        .iter()
        .find(|row| row.filename == "flat.png")
        .unwrap();
    assert_eq!(flat.record.original_size, 48);
    assert_eq!(flat.record.encoded_size, 2);
    assert_eq!(flat.record.compression_ratio, 24.0);
    assert_eq!(flat.record.entropy, 0.0);

    let stream = fs::read(output.path().join(ENCODED_DIR).join("stream_encoded.rle")).unwrap();
    assert_eq!(stream, [1, 4, 2, 2, 3, 1]);

    let text = fs::read_to_string(config.report_path()).unwrap();
    assert!(text.starts_with(HEADER));
    let parsed = Report::parse(&text).unwrap();
    assert_eq!(parsed.rows.len(), 3);
    assert_eq!(parsed.rows[0].filename, "flat.png");
}

#[test]
fn test_failing_file_does_not_stop_batch() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    striped(&input.path().join("good.png"));
    fs::write(input.path().join("broken.png"), b"not a png").unwrap();
    fs::write(input.path().join("empty.raw"), b"").unwrap();
    fs::write(input.path().join("twin.raw"), [1u8]).unwrap();
    fs::write(input.path().join("twin.bin"), [2u8]).unwrap();

    let outcome = pipeline::run(&PipelineConfig::new(input.path(), output.path())).unwrap();
    assert_eq!(outcome.report.rows.len(), 1);
    assert_eq!(outcome.report.rows[0].filename, "good.png");

    let failed: Vec<_> = outcome
        .failures
        .iter()
        .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(failed, ["broken.png", "empty.raw", "twin.bin", "twin.raw"]);
    assert!(matches!(outcome.failures[0].error, Error::Image(_)));
    assert!(matches!(outcome.failures[1].error, Error::EmptyStream));
    assert!(matches!(outcome.failures[2].error, Error::DuplicateStem(_)));

    let text = fs::read_to_string(output.path().join("results.txt")).unwrap();
    assert_eq!(text.lines().count(), 2);
}

#[test]
fn test_missing_input_dir_fails_the_run() {
    let output = tempfile::tempdir().unwrap();
    let config = PipelineConfig::new(output.path().join("nowhere"), output.path());
    assert!(matches!(pipeline::run(&config), Err(Error::Io(_))));
}

#[test]
fn test_decode_file_reports_corruption() {
    let dir = tempfile::tempdir().unwrap();
    let encoded = dir.path().join("zero.rle");
    fs::write(&encoded, [8u8, 2, 9, 0]).unwrap();
    let result = pipeline::decode_file(&encoded, dir.path().join("zero.raw"));
    assert!(matches!(
        result,
        Err(Error::Corrupted(Corruption::ZeroLength { offset: 2 }))
    ));
}

#[test]
fn test_rerun_in_shared_dir_skips_previous_report() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("stream.raw"), [4u8, 4, 4, 9]).unwrap();
    let config = PipelineConfig::new(dir.path(), dir.path());

    for _ in 0..2 {
        let outcome = pipeline::run(&config).unwrap();
        assert!(outcome.is_clean(), "{:?}", outcome.failures);
        assert_eq!(outcome.report.rows.len(), 1);
        assert_eq!(outcome.report.rows[0].filename, "stream.raw");
    }
    let text = fs::read_to_string(config.report_path()).unwrap();
    assert_eq!(Report::parse(&text).unwrap().rows.len(), 1);
}
