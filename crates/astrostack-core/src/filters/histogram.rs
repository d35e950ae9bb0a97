use ndarray::Axis;

use crate::consts::{LUMINANCE_B, LUMINANCE_G, LUMINANCE_R, LUT_SIZE};
use crate::frame::Frame;

use super::tone::LevelsParams;

/// Levels that stretch the luma range between two percentiles to full scale.
///
/// `low_percentile` and `high_percentile` are fractions in [0.0, 1.0],
/// e.g. 0.001 and 0.999. Midtones are left at 1.0.
pub fn auto_levels(frame: &Frame, low_percentile: f32, high_percentile: f32) -> LevelsParams {
    let mut luma: Vec<f32> = frame
        .data
        .lanes(Axis(2))
        .into_iter()
        .map(|px| LUMINANCE_R * px[0] + LUMINANCE_G * px[1] + LUMINANCE_B * px[2])
        .collect();
    if luma.is_empty() {
        return LevelsParams::default();
    }

    let low = percentile(&mut luma, low_percentile.clamp(0.0, 1.0));
    let high = percentile(&mut luma, high_percentile.clamp(0.0, 1.0));
    let top = (LUT_SIZE - 1) as f32;
    let black = (low.clamp(0.0, 1.0) * top).floor() as u8;
    let white = (high.clamp(0.0, 1.0) * top).ceil() as u8;

    let (black, white) = if white > black {
        (black, white)
    } else if black < u8::MAX {
        (black, black + 1)
    } else {
        (black - 1, black)
    };
    LevelsParams {
        black_point: black,
        white_point: white,
        midtones: 1.0,
    }
}

/// Value at fraction `p` of the sorted data, by selection.
fn percentile(values: &mut [f32], p: f32) -> f32 {
    let idx = ((values.len() as f32 * p) as usize).min(values.len() - 1);
    *values.select_nth_unstable_by(idx, |a, b| a.total_cmp(b)).1
}
