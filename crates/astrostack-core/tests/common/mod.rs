#![allow(dead_code)]

use ndarray::Array3;

use astrostack_core::consts::CHANNELS;
use astrostack_core::frame::{Frame, Star};

/// Opaque grey frame with hard-edged bright discs painted on it.
///
/// Each disc is `(cx, cy, radius, value)`; later discs overwrite earlier ones.
pub fn frame_with_discs(
    width: usize,
    height: usize,
    background: f32,
    discs: &[(f64, f64, f64, f32)],
) -> Frame {
    let data = Array3::from_shape_fn((height, width, CHANNELS), |(row, col, ch)| {
        if ch == CHANNELS - 1 {
            return 1.0;
        }
        let mut v = background;
        for &(cx, cy, r, value) in discs {
            if (col as f64 - cx).hypot(row as f64 - cy) <= r {
                v = value;
            }
        }
        v
    });
    Frame::new(data, 8)
}

/// Opaque frame of Gaussian spots `(cx, cy, sigma, peak)` on a black sky.
pub fn gaussian_field(width: usize, height: usize, spots: &[(f64, f64, f64, f32)]) -> Frame {
    let data = Array3::from_shape_fn((height, width, CHANNELS), |(row, col, ch)| {
        if ch == CHANNELS - 1 {
            return 1.0;
        }
        spots
            .iter()
            .map(|&(cx, cy, sigma, peak)| {
                let d2 = (col as f64 - cx).powi(2) + (row as f64 - cy).powi(2);
                peak * (-d2 / (2.0 * sigma * sigma)).exp() as f32
            })
            .sum::<f32>()
            .min(1.0)
    });
    Frame::new(data, 8)
}

/// Opaque grey frame whose value depends on the pixel, so any misplaced
/// pixel shows up.
pub fn gradient_frame(width: usize, height: usize) -> Frame {
    let n = (width * height) as f32;
    let data = Array3::from_shape_fn((height, width, CHANNELS), |(row, col, ch)| {
        if ch == CHANNELS - 1 {
            1.0
        } else {
            (row * width + col + 1) as f32 / (n + 1.0)
        }
    });
    Frame::new(data, 8)
}

pub fn manual_stars(points: &[(f64, f64)]) -> Vec<Star> {
    points.iter().map(|&(x, y)| Star::manual(x, y)).collect()
}

/// A scattered, irregular star field used by the star-based aligners.
pub const FIELD: [(f64, f64); 10] = [
    (12.0, 14.0),
    (47.0, 21.0),
    (31.0, 63.0),
    (72.0, 77.0),
    (16.0, 84.0),
    (61.0, 43.0),
    (88.0, 11.0),
    (53.0, 92.0),
    (80.0, 55.0),
    (25.0, 38.0),
];

pub fn assert_frames_close(a: &Frame, b: &Frame, tolerance: f32) {
    assert_eq!(a.data.dim(), b.data.dim());
    for (i, (x, y)) in a.data.iter().zip(b.data.iter()).enumerate() {
        assert!(
            (x - y).abs() <= tolerance,
            "sample {i}: {x} vs {y} (tolerance {tolerance})"
        );
    }
}
