use ndarray::{ArrayViewMut1, Axis, Zip};
use serde::{Deserialize, Serialize};

use crate::consts::{LUMINANCE_B, LUMINANCE_G, LUMINANCE_R, LUT_SIZE, PARALLEL_PIXEL_THRESHOLD};
use crate::frame::Frame;

/// Input levels on the 8-bit scale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelsParams {
    /// Inputs at or below this map to 0.
    #[serde(default)]
    pub black_point: u8,
    /// Inputs at or above this map to 1.
    #[serde(default = "default_white_point")]
    pub white_point: u8,
    /// Gamma applied between the points as `x^(1/midtones)`; > 1 brightens.
    #[serde(default = "default_unity")]
    pub midtones: f32,
}

impl Default for LevelsParams {
    fn default() -> Self {
        Self {
            black_point: 0,
            white_point: 255,
            midtones: 1.0,
        }
    }
}

/// Global adjustments, all expressed in percent-like units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BasicAdjustments {
    /// Exposure in hundredths of a stop: the gain is `2^(exposure/100)`.
    #[serde(default)]
    pub exposure: f32,
    /// Linear gain in percent (100 = unchanged).
    #[serde(default = "default_percent")]
    pub brightness: f32,
    /// Colourfulness in percent (0 = grey, 100 = unchanged).
    #[serde(default = "default_percent")]
    pub saturation: f32,
}

impl Default for BasicAdjustments {
    fn default() -> Self {
        Self {
            exposure: 0.0,
            brightness: 100.0,
            saturation: 100.0,
        }
    }
}

fn default_white_point() -> u8 {
    255
}
fn default_unity() -> f32 {
    1.0
}
fn default_percent() -> f32 {
    100.0
}

/// Tone section of a job configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ToneSettings {
    #[serde(default)]
    pub levels: LevelsParams,
    #[serde(default)]
    pub basic: BasicAdjustments,
    /// Derive the levels from luma percentiles `(low, high)` instead.
    #[serde(default)]
    pub auto_levels: Option<(f32, f32)>,
}

/// 256-entry levels lookup table indexed by the 8-bit input value.
pub fn build_lut(levels: &LevelsParams) -> [f32; LUT_SIZE] {
    let black = levels.black_point as f32;
    let white = levels.white_point as f32;
    let inv_gamma = 1.0 / levels.midtones.max(1e-3);
    let mut lut = [0.0f32; LUT_SIZE];
    for (i, slot) in lut.iter_mut().enumerate() {
        let v = i as f32;
        *slot = if v <= black {
            0.0
        } else if v >= white {
            1.0
        } else {
            ((v - black) / (white - black)).powf(inv_gamma)
        };
    }
    lut
}

/// Levels, then exposure and brightness, then saturation. Only the colour
/// channels are touched.
pub fn apply(frame: &Frame, levels: &LevelsParams, basic: &BasicAdjustments) -> Frame {
    let lut = build_lut(levels);
    let gain = 2f32.powf(basic.exposure / 100.0) * basic.brightness / 100.0;
    let saturation = basic.saturation / 100.0;

    let adjust = |mut px: ArrayViewMut1<'_, f32>| {
        let mut rgb = [0.0f32; 3];
        for (ch, slot) in rgb.iter_mut().enumerate() {
            let index = (px[ch].clamp(0.0, 1.0) * (LUT_SIZE - 1) as f32).round() as usize;
            *slot = (lut[index] * gain).clamp(0.0, 1.0);
        }
        let luma = LUMINANCE_R * rgb[0] + LUMINANCE_G * rgb[1] + LUMINANCE_B * rgb[2];
        for (ch, v) in rgb.into_iter().enumerate() {
            px[ch] = (luma + (v - luma) * saturation).clamp(0.0, 1.0);
        }
    };

    let mut data = frame.data.clone();
    let (h, w, _) = data.dim();
    let pixels = Zip::from(data.lanes_mut(Axis(2)));
    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        pixels.par_for_each(adjust);
    } else {
        pixels.for_each(adjust);
    }

    let mut out = Frame::new(data, frame.original_bit_depth);
    out.metadata = frame.metadata.clone();
    out
}

/// Apply a full tone section, resolving automatic levels first.
pub fn apply_settings(frame: &Frame, settings: &ToneSettings) -> Frame {
    let levels = match settings.auto_levels {
        Some((low, high)) => super::histogram::auto_levels(frame, low, high),
        None => settings.levels,
    };
    apply(frame, &levels, &settings.basic)
}
