use std::sync::Arc;

use ndarray::{Array2, ArrayView2, Axis};
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::consts::EPSILON;

/// Integer-plus-subpixel location of a phase-correlation peak.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CorrelationPeak {
    /// Translation (px) that maps target coordinates onto the reference.
    pub dx: f64,
    pub dy: f64,
    /// Peak height divided by the mean absolute correlation.
    pub confidence: f64,
}

/// FFT phase correlation of two equally sized brightness maps.
///
/// Returns `None` for empty or mismatched inputs.
pub fn phase_correlate(
    reference: ArrayView2<'_, f32>,
    target: ArrayView2<'_, f32>,
) -> Option<CorrelationPeak> {
    let (h, w) = reference.dim();
    if h == 0 || w == 0 || target.dim() != (h, w) {
        return None;
    }

    let mut planner = FftPlanner::<f64>::new();
    let forward = (planner.plan_fft_forward(h), planner.plan_fft_forward(w));
    let inverse = (planner.plan_fft_inverse(h), planner.plan_fft_inverse(w));

    let mut ref_spectrum = windowed_complex(reference);
    let mut tgt_spectrum = windowed_complex(target);
    fft2d(&mut ref_spectrum, &forward);
    fft2d(&mut tgt_spectrum, &forward);

    // Normalized cross-power spectrum, reusing the reference buffer.
    ref_spectrum.zip_mut_with(&tgt_spectrum, |r, t| {
        let cross = *r * t.conj();
        let mag = cross.norm();
        *r = if mag > 1e-12 { cross / mag } else { Complex::new(0.0, 0.0) };
    });
    fft2d(&mut ref_spectrum, &inverse);
    let scale = 1.0 / (h * w) as f64;
    let surface = ref_spectrum.mapv(|c| c.re * scale);

    let ((peak_row, peak_col), peak) = surface
        .indexed_iter()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(idx, &v)| (idx, v))?;
    let mean_abs = surface.iter().map(|v| v.abs()).sum::<f64>() / (h * w) as f64;
    let confidence = if mean_abs > EPSILON as f64 {
        peak / mean_abs
    } else {
        0.0
    };

    let (sub_row, sub_col) = refine_peak(&surface, peak_row, peak_col);
    Some(CorrelationPeak {
        dx: wrap_signed(peak_col, w) + sub_col,
        dy: wrap_signed(peak_row, h) + sub_row,
        confidence,
    })
}

/// Peak index on a circular axis of length `n`, as a signed shift.
fn wrap_signed(index: usize, n: usize) -> f64 {
    if index > n / 2 {
        index as f64 - n as f64
    } else {
        index as f64
    }
}

/// Separable Hann window, converted to complex.
fn windowed_complex(data: ArrayView2<'_, f32>) -> Array2<Complex<f64>> {
    let (h, w) = data.dim();
    let hann = |i: usize, n: usize| 0.5 * (1.0 - (std::f64::consts::TAU * i as f64 / n as f64).cos());
    let col_window: Vec<f64> = (0..w).map(|c| hann(c, w)).collect();
    Array2::from_shape_fn((h, w), |(row, col)| {
        let weight = hann(row, h) * col_window[col];
        Complex::new(data[[row, col]] as f64 * weight, 0.0)
    })
}

/// In-place 2D transform: along rows, then along columns.
fn fft2d(data: &mut Array2<Complex<f64>>, plans: &(Arc<dyn Fft<f64>>, Arc<dyn Fft<f64>>)) {
    let (col_plan, row_plan) = plans;
    transform_lanes(data, Axis(1), row_plan.as_ref());
    transform_lanes(data, Axis(0), col_plan.as_ref());
}

fn transform_lanes(data: &mut Array2<Complex<f64>>, axis: Axis, plan: &dyn Fft<f64>) {
    let mut buffer = vec![Complex::new(0.0, 0.0); data.len_of(axis)];
    for mut lane in data.lanes_mut(axis) {
        for (slot, v) in buffer.iter_mut().zip(lane.iter()) {
            *slot = *v;
        }
        plan.process(&mut buffer);
        for (v, slot) in lane.iter_mut().zip(buffer.iter()) {
            *v = *slot;
        }
    }
}

/// Paraboloid refinement on the 3x3 neighbourhood of the peak. The surface
/// is circular, so neighbours wrap around the edges.
fn refine_peak(surface: &Array2<f64>, row: usize, col: usize) -> (f64, f64) {
    let (h, w) = surface.dim();
    if h < 3 || w < 3 {
        return (0.0, 0.0);
    }
    let centre = surface[[row, col]];
    let up = surface[[(row + h - 1) % h, col]];
    let down = surface[[(row + 1) % h, col]];
    let left = surface[[row, (col + w - 1) % w]];
    let right = surface[[row, (col + 1) % w]];

    let vertex = |prev: f64, next: f64| {
        let curvature = prev - 2.0 * centre + next;
        if curvature.abs() > 1e-12 {
            ((prev - next) / (2.0 * curvature)).clamp(-0.5, 0.5)
        } else {
            0.0
        }
    };
    (vertex(up, down), vertex(left, right))
}
