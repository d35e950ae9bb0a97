mod common;

use astrostack_core::consts::ALPHA;
use astrostack_core::error::StackError;
use astrostack_core::frame::Frame;
use astrostack_core::io::{decode_frame, load_frame, save_frame, save_png, save_tiff};

use common::gradient_frame;

fn sample_frame(bit_depth: u8) -> Frame {
    let mut frame = gradient_frame(4, 3);
    frame.original_bit_depth = bit_depth;
    frame.data[[1, 2, ALPHA]] = 0.0;
    frame
}

#[test]
fn test_tiff_roundtrip_keeps_alpha() {
    let frame = sample_frame(16);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stack.tiff");

    save_tiff(&frame, &path).unwrap();
    let loaded = load_frame(&path).unwrap();

    assert_eq!(loaded.dimensions(), (4, 3));
    assert_eq!(loaded.original_bit_depth, 16);
    assert_eq!(loaded.metadata.label.as_deref(), Some("stack.tiff"));
    assert_eq!(loaded.data[[1, 2, ALPHA]], 0.0);
    for (a, b) in loaded.data.iter().zip(frame.data.iter()) {
        assert!((a - b).abs() < 1e-4, "{a} vs {b}");
    }
}

#[test]
fn test_png_depth_follows_source() {
    let dir = tempfile::tempdir().unwrap();

    let path8 = dir.path().join("eight.png");
    save_png(&sample_frame(8), &path8).unwrap();
    assert_eq!(load_frame(&path8).unwrap().original_bit_depth, 8);

    let path16 = dir.path().join("sixteen.png");
    save_png(&sample_frame(16), &path16).unwrap();
    let loaded = load_frame(&path16).unwrap();
    assert_eq!(loaded.original_bit_depth, 16);
    assert!((loaded.data[[2, 3, 0]] - sample_frame(16).data[[2, 3, 0]]).abs() < 1e-4);
}

#[test]
fn test_save_frame_picks_format_from_extension() {
    let dir = tempfile::tempdir().unwrap();
    let frame = sample_frame(8);

    for name in ["out.tif", "out.png", "out.bmp"] {
        let path = dir.path().join(name);
        save_frame(&frame, &path).unwrap();
        let loaded = load_frame(&path).unwrap();
        assert_eq!(loaded.dimensions(), (4, 3), "{name}");
    }

    // BMP carries no alpha, so the transparent pixel comes back opaque.
    let bmp = load_frame(&dir.path().join("out.bmp")).unwrap();
    assert_eq!(bmp.data[[1, 2, ALPHA]], 1.0);
}

#[test]
fn test_decode_from_memory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mem.png");
    save_png(&sample_frame(8), &path).unwrap();
    let bytes = std::fs::read(&path).unwrap();

    let frame = decode_frame(&bytes).unwrap();
    assert_eq!(frame.dimensions(), (4, 3));
    assert!(frame.metadata.label.is_none());
}

#[test]
fn test_garbage_is_an_image_error() {
    assert!(matches!(
        decode_frame(b"definitely not an image"),
        Err(StackError::ImageError(_))
    ));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_frame(&dir.path().join("nope.png")).is_err());
}
