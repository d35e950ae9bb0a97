use ndarray::parallel::prelude::*;
use ndarray::{Array3, ArrayViewMut2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::{ALPHA, ALPHA_EPSILON, CHANNELS, PARALLEL_PIXEL_THRESHOLD};
use crate::error::{Result, StackError};
use crate::frame::Frame;

use super::median::median_in_place;
use super::sigma_clip::{clipped_mean, SigmaClipParams};

/// Rule for reducing a stack of co-registered frames to one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum CombineMode {
    #[default]
    Average,
    Median,
    /// Per-channel maximum.
    Lighten,
    /// Per-channel minimum.
    Darken,
    SigmaClip(SigmaClipParams),
}

impl std::fmt::Display for CombineMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Average => write!(f, "Average"),
            Self::Median => write!(f, "Median"),
            Self::Lighten => write!(f, "Lighten (max)"),
            Self::Darken => write!(f, "Darken (min)"),
            Self::SigmaClip(p) => write!(f, "Sigma clip ({}σ, {} passes)", p.sigma, p.iterations),
        }
    }
}

/// Reduce co-registered frames pixel by pixel.
///
/// Only frames whose alpha at a pixel exceeds [`ALPHA_EPSILON`] contribute to
/// it. A pixel with no contributors is 0 on every channel. Results are
/// clamped to `[0, 1]`.
pub fn combine(frames: &[Frame], mode: &CombineMode) -> Result<Frame> {
    let first = frames.first().ok_or(StackError::EmptySequence)?;
    let (h, w, _) = first.data.dim();
    for frame in frames {
        if frame.data.dim() != (h, w, CHANNELS) {
            return Err(StackError::DimensionMismatch {
                frame: frame.metadata.frame_index,
                expected: (w, h),
                actual: frame.dimensions(),
            });
        }
    }

    let n = frames.len();
    let mut out = Array3::<f32>::zeros((h, w, CHANNELS));
    let fill_row = |row: usize, mut out_row: ArrayViewMut2<'_, f32>| {
        let mut contributors = Vec::with_capacity(n);
        let mut values = Vec::with_capacity(n);
        let mut keep = vec![true; n];
        for col in 0..w {
            contributors.clear();
            contributors.extend(
                frames
                    .iter()
                    .filter(|f| f.data[[row, col, ALPHA]] > ALPHA_EPSILON),
            );
            if contributors.is_empty() {
                continue;
            }
            for ch in 0..CHANNELS {
                values.clear();
                values.extend(contributors.iter().map(|f| f.data[[row, col, ch]]));
                let v = reduce(&mut values, &mut keep[..contributors.len()], mode);
                out_row[[col, ch]] = v.clamp(0.0, 1.0);
            }
        }
    };

    if h * w >= PARALLEL_PIXEL_THRESHOLD && n > 1 {
        out.axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(row, out_row)| fill_row(row, out_row));
    } else {
        for (row, out_row) in out.axis_iter_mut(Axis(0)).enumerate() {
            fill_row(row, out_row);
        }
    }

    debug!(frames = n, mode = %mode, "Combined stack");
    let bit_depth = frames.iter().map(|f| f.original_bit_depth).max().unwrap_or(8);
    Ok(Frame::new(out, bit_depth))
}

/// Reduce one channel's contributing values. `values` is non-empty.
fn reduce(values: &mut [f32], keep: &mut [bool], mode: &CombineMode) -> f32 {
    match mode {
        CombineMode::Average => values.iter().sum::<f32>() / values.len() as f32,
        CombineMode::Median => median_in_place(values),
        CombineMode::Lighten => values.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        CombineMode::Darken => values.iter().copied().fold(f32::INFINITY, f32::min),
        CombineMode::SigmaClip(params) => clipped_mean(values, keep, params),
    }
}
