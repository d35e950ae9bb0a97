use ndarray::parallel::prelude::*;
use ndarray::{Array3, ArrayViewMut2, Axis};
use serde::{Deserialize, Serialize};

use crate::align::Transform;
use crate::consts::{ALPHA, CHANNELS, EPSILON, PARALLEL_PIXEL_THRESHOLD, SUBPIXEL_SNAP};
use crate::error::{Result, StackError};
use crate::frame::Frame;

/// Sampling kernel used when mapping a frame onto the reference grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interpolation {
    #[default]
    Bilinear,
    Nearest,
}

impl std::fmt::Display for Interpolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bilinear => write!(f, "Bilinear"),
            Self::Nearest => write!(f, "Nearest"),
        }
    }
}

/// Map `frame` onto a `width` x `height` grid, where `transform` takes frame
/// coordinates to grid coordinates.
///
/// Each output pixel is sampled at the inverse-transformed position. Taps
/// outside the source contribute nothing: colour is renormalised by the
/// in-bounds weight and alpha is scaled by it, so uncovered pixels come out
/// transparent black.
pub fn resample(
    frame: &Frame,
    transform: &Transform,
    width: usize,
    height: usize,
    interpolation: Interpolation,
) -> Result<Frame> {
    let inverse = transform.inverse().ok_or_else(|| {
        StackError::InvalidFrame(format!("transform is not invertible: {transform:?}"))
    })?;

    let mut out = Array3::<f32>::zeros((height, width, CHANNELS));
    let fill_row = |row: usize, mut out_row: ArrayViewMut2<'_, f32>| {
        for col in 0..width {
            let (sx, sy) = inverse.apply(col as f64, row as f64);
            let (sx, sy) = (snap(sx), snap(sy));
            let px = match interpolation {
                Interpolation::Bilinear => bilinear_sample(frame, sx, sy),
                Interpolation::Nearest => nearest_sample(frame, sx, sy),
            };
            for (ch, v) in px.into_iter().enumerate() {
                out_row[[col, ch]] = v;
            }
        }
    };

    if width * height >= PARALLEL_PIXEL_THRESHOLD {
        out.axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(row, out_row)| fill_row(row, out_row));
    } else {
        for (row, out_row) in out.axis_iter_mut(Axis(0)).enumerate() {
            fill_row(row, out_row);
        }
    }

    let mut resampled = Frame::new(out, frame.original_bit_depth);
    resampled.metadata = frame.metadata.clone();
    Ok(resampled)
}

/// Snap coordinates that are an integer up to rounding noise.
fn snap(v: f64) -> f64 {
    let rounded = v.round();
    if (v - rounded).abs() < SUBPIXEL_SNAP {
        rounded
    } else {
        v
    }
}

/// Bilinear RGBA sample at `(x, y)` with coverage-weighted alpha.
pub fn bilinear_sample(frame: &Frame, x: f64, y: f64) -> [f32; CHANNELS] {
    let (h, w) = (frame.height() as i64, frame.width() as i64);
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = (x - x0 as f64) as f32;
    let fy = (y - y0 as f64) as f32;

    let taps = [
        (y0, x0, (1.0 - fx) * (1.0 - fy)),
        (y0, x0 + 1, fx * (1.0 - fy)),
        (y0 + 1, x0, (1.0 - fx) * fy),
        (y0 + 1, x0 + 1, fx * fy),
    ];

    let mut acc = [0.0f32; CHANNELS];
    let mut coverage = 0.0f32;
    for (r, c, weight) in taps {
        if weight <= 0.0 || r < 0 || r >= h || c < 0 || c >= w {
            continue;
        }
        coverage += weight;
        for (ch, slot) in acc.iter_mut().enumerate() {
            *slot += weight * frame.data[[r as usize, c as usize, ch]];
        }
    }

    if coverage <= EPSILON {
        return [0.0; CHANNELS];
    }
    // Colour is renormalised; alpha keeps the raw weighted sum, which is the
    // renormalised alpha times coverage.
    for (ch, slot) in acc.iter_mut().enumerate() {
        if ch != ALPHA {
            *slot /= coverage;
        }
    }
    acc
}

fn nearest_sample(frame: &Frame, x: f64, y: f64) -> [f32; CHANNELS] {
    let (col, row) = (x.round(), y.round());
    if col < 0.0 || row < 0.0 || col >= frame.width() as f64 || row >= frame.height() as f64 {
        return [0.0; CHANNELS];
    }
    frame.pixel(col as usize, row as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snap_only_touches_near_integers() {
        assert_eq!(snap(2.0000000001), 2.0);
        assert_eq!(snap(-0.9999999999), -1.0);
        assert_eq!(snap(2.25), 2.25);
    }

    #[test]
    fn half_covered_edge_keeps_colour_and_halves_alpha() {
        let frame = Frame::filled(2, 2, [0.8, 0.4, 0.2, 1.0]);
        let px = bilinear_sample(&frame, 1.5, 0.0);
        assert!((px[0] - 0.8).abs() < 1e-6);
        assert!((px[ALPHA] - 0.5).abs() < 1e-6);
    }
}
