mod common;

use approx::assert_abs_diff_eq;
use ndarray::Array3;

use astrostack_core::consts::ALPHA;
use astrostack_core::error::StackError;
use astrostack_core::frame::Frame;
use astrostack_core::stack::{combine, CombineMode, SigmaClipParams};

fn grey(value: f32) -> Frame {
    Frame::filled(4, 4, [value, value, value, 1.0])
}

#[test]
fn test_average_of_two() {
    let result = combine(&[grey(0.0), grey(1.0)], &CombineMode::Average).unwrap();
    assert_abs_diff_eq!(result.data[[0, 0, 0]], 0.5, epsilon = 1e-6);
    assert_abs_diff_eq!(result.data[[3, 3, 2]], 0.5, epsilon = 1e-6);
    assert_abs_diff_eq!(result.data[[1, 1, ALPHA]], 1.0, epsilon = 1e-6);
}

#[test]
fn test_identical_frames_every_mode() {
    let frames: Vec<Frame> = (0..7).map(|_| grey(0.3)).collect();
    for mode in [
        CombineMode::Average,
        CombineMode::Median,
        CombineMode::Lighten,
        CombineMode::Darken,
        CombineMode::SigmaClip(SigmaClipParams::default()),
    ] {
        let result = combine(&frames, &mode).unwrap();
        for &v in result.data.iter().step_by(4) {
            assert_abs_diff_eq!(v, 0.3, epsilon = 1e-5);
        }
    }
}

#[test]
fn test_median_lighten_darken() {
    let frames = [grey(0.1), grey(0.9), grey(0.4)];
    let median = combine(&frames, &CombineMode::Median).unwrap();
    let lighten = combine(&frames, &CombineMode::Lighten).unwrap();
    let darken = combine(&frames, &CombineMode::Darken).unwrap();
    assert_eq!(median.data[[2, 1, 0]], 0.4);
    assert_eq!(lighten.data[[2, 1, 0]], 0.9);
    assert_eq!(darken.data[[2, 1, 0]], 0.1);
}

#[test]
fn test_median_ignores_corrupted_pixel() {
    let mut frames: Vec<Frame> = (0..5).map(|_| grey(0.25)).collect();
    frames[3].data[[2, 2, 1]] = 1.0;
    let median = combine(&frames, &CombineMode::Median).unwrap();
    let average = combine(&frames, &CombineMode::Average).unwrap();
    assert_eq!(median.data[[2, 2, 1]], 0.25);
    assert!((average.data[[2, 2, 1]] - 0.25).abs() > 0.1);
}

#[test]
fn test_sigma_clip_rejects_outlier() {
    let mut frames: Vec<Frame> = (0..9).map(|_| grey(0.5)).collect();
    frames.push(grey(1.0));
    let clipped = combine(&frames, &CombineMode::SigmaClip(SigmaClipParams::default())).unwrap();
    let average = combine(&frames, &CombineMode::Average).unwrap();
    assert_abs_diff_eq!(clipped.data[[0, 0, 0]], 0.5, epsilon = 1e-6);
    assert_abs_diff_eq!(average.data[[0, 0, 0]], 0.55, epsilon = 1e-6);
}

#[test]
fn test_transparent_pixels_do_not_contribute() {
    let mut partial = grey(1.0);
    // Left half of the second frame is uncovered.
    for row in 0..4 {
        for col in 0..2 {
            partial.data[[row, col, ALPHA]] = 0.0;
        }
    }
    let result = combine(&[grey(0.2), partial], &CombineMode::Average).unwrap();
    assert_abs_diff_eq!(result.data[[0, 0, 0]], 0.2, epsilon = 1e-6);
    assert_abs_diff_eq!(result.data[[0, 3, 0]], 0.6, epsilon = 1e-6);
}

#[test]
fn test_pixel_without_contributors_is_zero() {
    let hole = Frame::filled(2, 2, [0.7, 0.7, 0.7, 0.0]);
    let result = combine(&[hole.clone(), hole], &CombineMode::Lighten).unwrap();
    assert!(result.data.iter().all(|&v| v == 0.0));
}

#[test]
fn test_bit_depth_is_widest_input() {
    let deep = Frame::new(Array3::from_elem((4, 4, 4), 0.5), 16);
    let result = combine(&[grey(0.5), deep], &CombineMode::Average).unwrap();
    assert_eq!(result.original_bit_depth, 16);
}

#[test]
fn test_dimension_mismatch() {
    let mut small = Frame::filled(3, 4, [0.5, 0.5, 0.5, 1.0]);
    small.metadata.frame_index = 1;
    let err = combine(&[grey(0.5), small], &CombineMode::Average).unwrap_err();
    match err {
        StackError::DimensionMismatch {
            frame,
            expected,
            actual,
        } => {
            assert_eq!(frame, 1);
            assert_eq!(expected, (4, 4));
            assert_eq!(actual, (3, 4));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_empty_error() {
    let frames: Vec<Frame> = vec![];
    assert!(matches!(
        combine(&frames, &CombineMode::Average),
        Err(StackError::EmptySequence)
    ));
}

#[test]
fn test_combine_mode_display() {
    assert_eq!(CombineMode::default().to_string(), "Average");
    assert_eq!(CombineMode::Median.to_string(), "Median");
}
