use std::cmp::Ordering;

use ndarray::Array3;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::consts::{
    COLOR_CHANNELS, DEFAULT_INPAINT_FILL_RADIUS, DEFAULT_INPAINT_SEARCH_RADIUS,
    DEFAULT_MASK_MARGIN, DEFAULT_SATURATION_THRESHOLD, DEFAULT_STAR_THRESHOLD,
    DEFAULT_SURROUND_RADIUS,
};
use crate::detection::blobs::{brightness_map, extract_blobs, is_extended_structure};
use crate::frame::Frame;

use super::star_mask::StarMask;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StarRemovalConfig {
    /// Brightness threshold for the stars to remove. Lower removes more.
    #[serde(default = "default_strength")]
    pub strength: f32,
    /// Pixels added to each star's mask radius.
    #[serde(default = "default_margin")]
    pub margin: usize,
    #[serde(default = "default_surround_radius")]
    pub surround_radius: f64,
    /// Blobs in surroundings brighter than this are kept (nebula cores,
    /// planetary discs).
    #[serde(default = "default_saturation_threshold")]
    pub saturation_threshold: f32,
    /// How far to look for known pixels when ordering the fill.
    #[serde(default = "default_search_radius")]
    pub search_radius: usize,
    /// Radius of the inverse-distance-squared fill kernel.
    #[serde(default = "default_fill_radius")]
    pub fill_radius: usize,
}

fn default_strength() -> f32 {
    DEFAULT_STAR_THRESHOLD
}
fn default_margin() -> usize {
    DEFAULT_MASK_MARGIN
}
fn default_surround_radius() -> f64 {
    DEFAULT_SURROUND_RADIUS
}
fn default_saturation_threshold() -> f32 {
    DEFAULT_SATURATION_THRESHOLD
}
fn default_search_radius() -> usize {
    DEFAULT_INPAINT_SEARCH_RADIUS
}
fn default_fill_radius() -> usize {
    DEFAULT_INPAINT_FILL_RADIUS
}

impl Default for StarRemovalConfig {
    fn default() -> Self {
        Self {
            strength: DEFAULT_STAR_THRESHOLD,
            margin: DEFAULT_MASK_MARGIN,
            surround_radius: DEFAULT_SURROUND_RADIUS,
            saturation_threshold: DEFAULT_SATURATION_THRESHOLD,
            search_radius: DEFAULT_INPAINT_SEARCH_RADIUS,
            fill_radius: DEFAULT_INPAINT_FILL_RADIUS,
        }
    }
}

/// What a star-removal pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RemovalReport {
    pub stars: usize,
    pub masked: usize,
    pub filled: usize,
    /// Masked pixels left untouched for lack of known neighbours.
    pub unfilled: usize,
}

/// Mask the stars of `frame` and inpaint them from their surroundings.
///
/// Only colour channels are rewritten; alpha and every pixel outside the
/// mask are left exactly as they were.
pub fn remove_stars(frame: &Frame, config: &StarRemovalConfig) -> (Frame, RemovalReport) {
    let (mut mask, stars) = build_star_mask(frame, config);
    let masked = mask.count();

    let mut data = frame.data.clone();
    let filled = inpaint(&mut data, &mut mask, config.search_radius, config.fill_radius);

    let report = RemovalReport {
        stars,
        masked,
        filled,
        unfilled: masked - filled,
    };
    info!(
        stars = report.stars,
        masked = report.masked,
        filled = report.filled,
        unfilled = report.unfilled,
        "Star removal complete"
    );

    let mut out = Frame::new(data, frame.original_bit_depth);
    out.metadata = frame.metadata.clone();
    (out, report)
}

/// Mask a disc around every star-like blob. Returns the mask and the number
/// of stars it covers.
pub fn build_star_mask(frame: &Frame, config: &StarRemovalConfig) -> (StarMask, usize) {
    let map = brightness_map(frame);
    let mut mask = StarMask::new(frame.width(), frame.height());
    let mut stars = 0;

    for blob in extract_blobs(&map, config.strength) {
        if is_extended_structure(&map, &blob, config.surround_radius, config.saturation_threshold) {
            continue;
        }
        let radius = blob.equivalent_radius().ceil() + config.margin as f64;
        mask.paint_disc(blob.x, blob.y, radius);
        stars += 1;
    }
    (mask, stars)
}

/// Fill masked pixels from their unmasked neighbours, nearest-to-known
/// first. Returns the number of pixels filled.
///
/// Pixels are visited in order of distance to the closest unmasked pixel
/// within `search_radius` (pixels with none come last), ties broken by
/// distance to the image centre. Each visited pixel takes the
/// inverse-distance-squared mean of the unmasked pixels within `fill_radius`
/// and is unmasked at once, so later pixels can draw on it.
pub fn inpaint(
    data: &mut Array3<f32>,
    mask: &mut StarMask,
    search_radius: usize,
    fill_radius: usize,
) -> usize {
    let (h, w, _) = data.dim();
    let (centre_x, centre_y) = ((w as f64 - 1.0) / 2.0, (h as f64 - 1.0) / 2.0);

    let mut order: Vec<(usize, usize, Option<f64>, f64)> = mask
        .masked_pixels()
        .into_iter()
        .map(|(x, y)| {
            let known = nearest_unmasked(mask, x, y, search_radius);
            let to_centre = (x as f64 - centre_x).hypot(y as f64 - centre_y);
            (x, y, known, to_centre)
        })
        .collect();
    order.sort_by(|a, b| compare_known(a.2, b.2).then(a.3.total_cmp(&b.3)));

    let r = fill_radius as isize;
    let mut filled = 0;
    for (x, y, _, _) in order {
        let mut acc = [0.0f64; COLOR_CHANNELS];
        let mut weight_sum = 0.0f64;
        for dy in -r..=r {
            for dx in -r..=r {
                let d2 = (dx * dx + dy * dy) as f64;
                if d2 == 0.0 || d2 > (r * r) as f64 {
                    continue;
                }
                let (nx, ny) = (x as isize + dx, y as isize + dy);
                if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                    continue;
                }
                let (nx, ny) = (nx as usize, ny as usize);
                if mask.is_masked(nx, ny) {
                    continue;
                }
                let weight = 1.0 / d2;
                weight_sum += weight;
                for (ch, slot) in acc.iter_mut().enumerate() {
                    *slot += weight * data[[ny, nx, ch]] as f64;
                }
            }
        }
        if weight_sum <= 0.0 {
            continue;
        }
        for (ch, v) in acc.iter().enumerate() {
            data[[y, x, ch]] = (v / weight_sum) as f32;
        }
        mask.clear(x, y);
        filled += 1;
    }
    filled
}

/// Distance to the closest unmasked pixel within `radius`, if any.
fn nearest_unmasked(mask: &StarMask, x: usize, y: usize, radius: usize) -> Option<f64> {
    let r = radius as isize;
    let mut best: Option<f64> = None;
    for dy in -r..=r {
        for dx in -r..=r {
            let (nx, ny) = (x as isize + dx, y as isize + dy);
            if nx < 0 || ny < 0 || nx >= mask.width() as isize || ny >= mask.height() as isize {
                continue;
            }
            if mask.is_masked(nx as usize, ny as usize) {
                continue;
            }
            let d = ((dx * dx + dy * dy) as f64).sqrt();
            if best.map_or(true, |b| d < b) {
                best = Some(d);
            }
        }
    }
    best
}

/// Known distances first, ascending; unknown last.
fn compare_known(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
