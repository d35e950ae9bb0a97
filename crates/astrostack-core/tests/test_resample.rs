mod common;

use astrostack_core::align::Transform;
use astrostack_core::consts::ALPHA;
use astrostack_core::error::AlignFailure;
use astrostack_core::frame::Frame;
use astrostack_core::resample::{resample, Interpolation};

use common::{assert_frames_close, gradient_frame};

#[test]
fn test_identity_is_lossless() {
    let frame = gradient_frame(6, 5);
    for interpolation in [Interpolation::Bilinear, Interpolation::Nearest] {
        let out = resample(&frame, &Transform::identity(), 6, 5, interpolation).unwrap();
        assert_frames_close(&out, &frame, 0.0);
    }
}

#[test]
fn test_integer_translation_moves_pixels() {
    let frame = gradient_frame(4, 3);
    // Target content sits one column right of the reference.
    let out = resample(&frame, &Transform::translation(-1.0, 0.0), 4, 3, Interpolation::Bilinear)
        .unwrap();

    for row in 0..3 {
        for col in 0..3 {
            assert_eq!(out.pixel(col, row), frame.pixel(col + 1, row));
        }
        assert_eq!(out.pixel(3, row), [0.0; 4], "uncovered column is transparent");
    }
}

#[test]
fn test_half_pixel_shift() {
    let mut frame = Frame::filled(3, 1, [0.0, 0.0, 0.0, 1.0]);
    for col in 0..3 {
        for ch in 0..3 {
            frame.data[[0, col, ch]] = col as f32;
        }
    }
    let shift = Transform::translation(-0.5, 0.0);

    let bilinear = resample(&frame, &shift, 3, 1, Interpolation::Bilinear).unwrap();
    assert!((bilinear.data[[0, 0, 0]] - 0.5).abs() < 1e-6);
    assert!((bilinear.data[[0, 1, 0]] - 1.5).abs() < 1e-6);
    // Half the last output pixel falls off the source.
    assert!((bilinear.data[[0, 2, 0]] - 2.0).abs() < 1e-6);
    assert!((bilinear.data[[0, 2, ALPHA]] - 0.5).abs() < 1e-6);

    let nearest = resample(&frame, &shift, 3, 1, Interpolation::Nearest).unwrap();
    assert_eq!(nearest.data[[0, 0, 0]], 1.0);
    assert_eq!(nearest.data[[0, 2, ALPHA]], 0.0);
}

#[test]
fn test_output_uses_requested_grid() {
    let frame = gradient_frame(4, 4);
    let out = resample(&frame, &Transform::identity(), 6, 2, Interpolation::Bilinear).unwrap();
    assert_eq!(out.dimensions(), (6, 2));
    assert_eq!(out.pixel(5, 1)[ALPHA], 0.0);
    assert_eq!(out.pixel(3, 1), frame.pixel(3, 1));
}

#[test]
fn test_singular_transform_is_rejected() {
    let frame = gradient_frame(4, 4);
    let collapse = Transform::scaled(0.0, 1.0, 0.0, 0.0, 0.0);
    let err = resample(&frame, &collapse, 4, 4, Interpolation::Bilinear).unwrap_err();

    // A dropped frame keeps the resampler's own explanation.
    let reason = AlignFailure::ResampleFailed(err.to_string());
    assert!(reason.to_string().contains("not invertible"), "{reason}");
}

#[test]
fn test_metadata_is_kept() {
    let mut frame = gradient_frame(4, 4).with_label("light_0003.tif");
    frame.metadata.frame_index = 3;
    let out = resample(&frame, &Transform::translation(0.5, 0.5), 4, 4, Interpolation::Bilinear)
        .unwrap();
    assert_eq!(out.metadata.label.as_deref(), Some("light_0003.tif"));
    assert_eq!(out.metadata.frame_index, 3);
}
