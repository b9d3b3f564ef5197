//! End-to-end tests through the public `Session` API with the real backend.

use image::{ImageFormat, Rgb, RgbImage};
use image_reducer::config::{ReducerConfig, load_config};
use image_reducer::export::{CancelToken, ExportEvent};
use image_reducer::imaging::{Dimensions, OutputFormat};
use image_reducer::registry::FileInput;
use image_reducer::{ReduceError, Session};
use std::io::Cursor;

fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

fn png(width: u32, height: u32) -> FileInput {
    FileInput::new("photo.png", "image/png", encoded(width, height, ImageFormat::Png))
}

#[test]
fn text_file_is_rejected() {
    let mut session = Session::create(ReducerConfig::default());
    let err = session
        .add_file(FileInput::new("notes.txt", "text/plain", b"hello".to_vec()))
        .unwrap_err();

    assert!(matches!(err, ReduceError::InvalidInputKind { .. }));
    assert!(session.sources().is_empty());
}

#[test]
fn half_and_double_density() {
    let mut session = Session::create(ReducerConfig::default());
    session.add_file(png(800, 600)).unwrap();

    session.set_density(36.0).unwrap();
    let half = session.preview(None).unwrap();
    assert_eq!((half.original.width, half.original.height), (800, 600));
    assert_eq!(half.converted.output_dimensions(), Dimensions::new(400, 300));
    assert_eq!(half.converted.mime_type(), "image/webp");

    session.set_density(144.0).unwrap();
    let double = session.preview(None).unwrap();
    assert_eq!(double.converted.output_dimensions(), Dimensions::new(1600, 1200));
}

#[test]
fn baseline_density_keeps_dimensions() {
    let mut session = Session::create(ReducerConfig::default());
    session.add_file(png(123, 77)).unwrap();

    let preview = session.preview(None).unwrap();
    assert_eq!(preview.converted.output_dimensions(), Dimensions::new(123, 77));
}

#[test]
fn repeated_previews_agree_on_dimensions() {
    let mut session = Session::create(ReducerConfig::default());
    session.add_file(png(333, 211)).unwrap();
    session.set_density(50.0).unwrap();

    let first = session.preview(None).unwrap();
    let second = session.preview(None).unwrap();
    assert_eq!(
        first.converted.output_dimensions(),
        second.converted.output_dimensions()
    );
}

#[test]
fn batch_isolates_corrupt_entry() {
    let mut session = Session::create(ReducerConfig::default());
    session.add_file(png(40, 30)).unwrap();
    session
        .add_file(FileInput::new("broken.png", "image/png", b"not a png".to_vec()))
        .unwrap();
    let jpeg = encoded(64, 48, ImageFormat::Jpeg);
    session
        .add_file(FileInput::new("photo.jpg", "image/jpeg", jpeg))
        .unwrap();
    session.set_density(36.0).unwrap();

    let (tx, rx) = std::sync::mpsc::channel();
    let outcomes = session.export_all(&CancelToken::new(), Some(tx));
    let events: Vec<ExportEvent> = rx.iter().collect();

    let names: Vec<_> = outcomes.iter().map(|o| o.file_name.as_str()).collect();
    assert_eq!(names, ["reduced-1.webp", "reduced-2.webp", "reduced-3.webp"]);

    assert_eq!(
        outcomes[0].result.as_ref().unwrap().dimensions,
        Dimensions::new(20, 15)
    );
    assert!(matches!(
        outcomes[1].result,
        Err(ReduceError::UnsupportedFormat(_))
    ));
    assert_eq!(
        outcomes[2].result.as_ref().unwrap().dimensions,
        Dimensions::new(32, 24)
    );

    assert!(matches!(events.first(), Some(ExportEvent::Started { total: 3 })));
    match events.last() {
        Some(ExportEvent::Finished(summary)) => {
            assert_eq!((summary.exported, summary.failed, summary.cancelled), (2, 1, 0));
        }
        other => panic!("expected Finished, got {other:?}"),
    }
}

#[test]
fn jpeg_output_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("reducer.toml"),
        "[output]\nformat = \"image/jpeg\"\nquality = 0.5\n",
    )
    .unwrap();
    let config = load_config(dir.path()).unwrap();
    assert_eq!(config.output.format, OutputFormat::Jpeg);

    let mut session = Session::create(config);
    session.add_file(png(50, 50)).unwrap();
    let preview = session.preview(None).unwrap();

    assert_eq!(preview.download_name(), "converted.jpg");
    assert_eq!(&preview.converted.encoded_bytes[..2], &[0xFF, 0xD8]);
}

#[test]
fn cancelled_before_start_produces_no_files() {
    let mut session = Session::create(ReducerConfig::default());
    session.add_file(png(10, 10)).unwrap();
    session.add_file(png(20, 20)).unwrap();

    let cancel = CancelToken::new();
    cancel.cancel();
    let outcomes = session.export_all(&cancel, None);

    assert_eq!(outcomes.len(), 2);
    assert!(
        outcomes
            .iter()
            .all(|o| matches!(o.result, Err(ReduceError::Cancelled)))
    );
}
