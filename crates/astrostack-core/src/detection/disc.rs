use ndarray::Array2;

use crate::consts::BORDER_STRIP_WIDTH;
use crate::filters::gaussian_blur::gaussian_blur_map;

use super::blobs::flood_regions;
use super::config::DiscDetectionConfig;
use super::morphology::morphological_opening;
use super::threshold::compute_threshold;

/// The extended bright disc of a planetary frame.
#[derive(Clone, Debug)]
pub struct Disc {
    /// Background-subtracted centroid column.
    pub cx: f64,
    /// Background-subtracted centroid row.
    pub cy: f64,
    /// Radius of a circle with the same area.
    pub radius: f64,
}

/// Locate the disc in a brightness map.
///
/// Pipeline: Gaussian blur -> threshold -> morphological opening ->
/// connected components -> largest -> validate -> centroid.
///
/// Returns `None` if no component is large enough or the largest one is cut
/// by the frame border (its centroid would be biased).
pub fn detect_disc(map: &Array2<f32>, config: &DiscDetectionConfig) -> Option<Disc> {
    let (h, w) = map.dim();
    if h < 3 || w < 3 {
        return None;
    }

    let blurred = gaussian_blur_map(map, config.blur_sigma);
    let threshold = compute_threshold(&blurred, &config.threshold_method, config.sigma_multiplier);
    let opened = morphological_opening(&blurred.mapv(|v| v > threshold));

    let flat: Vec<bool> = opened.iter().copied().collect();
    let largest = flood_regions(h, w, |idx| flat[idx])
        .into_iter()
        .max_by_key(|region| region.len())?;

    if largest.len() < config.min_area {
        return None;
    }

    let mut mask = Array2::from_elem((h, w), false);
    let mut bbox = (usize::MAX, 0, usize::MAX, 0);
    for &idx in &largest {
        let (row, col) = (idx / w, idx % w);
        mask[[row, col]] = true;
        bbox.0 = bbox.0.min(row);
        bbox.1 = bbox.1.max(row);
        bbox.2 = bbox.2.min(col);
        bbox.3 = bbox.3.max(col);
    }
    if touches_border(bbox, h, w) {
        return None;
    }

    let background = estimate_background(map);
    let (cy, cx) = masked_centroid(map, &mask, bbox, background);
    let area = largest.len();

    Some(Disc {
        cx,
        cy,
        radius: (area as f64 / std::f64::consts::PI).sqrt(),
    })
}

/// Returns true if the bounding box touches any edge of the image.
pub fn touches_border(bbox: (usize, usize, usize, usize), height: usize, width: usize) -> bool {
    let (min_row, max_row, min_col, max_col) = bbox;
    min_row == 0 || min_col == 0 || max_row + 1 >= height || max_col + 1 >= width
}

/// Median of the pixels in a strip along the frame border.
pub fn estimate_background(map: &Array2<f32>) -> f32 {
    let (h, w) = map.dim();
    let strip = BORDER_STRIP_WIDTH.min(h / 2).min(w / 2);
    if strip == 0 {
        return 0.0;
    }

    let mut border: Vec<f32> = map
        .indexed_iter()
        .filter(|((row, col), _)| {
            *row < strip || *row >= h - strip || *col < strip || *col >= w - strip
        })
        .map(|(_, &v)| v)
        .collect();
    if border.is_empty() {
        return 0.0;
    }
    let mid = border.len() / 2;
    *border.select_nth_unstable_by(mid, |a, b| a.total_cmp(b)).1
}

/// Background-subtracted, brightness-weighted centroid of the masked pixels.
///
/// Returns `(row, col)`; falls back to the bounding-box centre when every
/// masked pixel is at or below the background.
fn masked_centroid(
    map: &Array2<f32>,
    mask: &Array2<bool>,
    bbox: (usize, usize, usize, usize),
    background: f32,
) -> (f64, f64) {
    let (min_row, max_row, min_col, max_col) = bbox;
    let mut sum_row = 0.0f64;
    let mut sum_col = 0.0f64;
    let mut sum_weight = 0.0f64;

    for row in min_row..=max_row {
        for col in min_col..=max_col {
            if mask[[row, col]] {
                let weight = (map[[row, col]] - background).max(0.0) as f64;
                sum_row += row as f64 * weight;
                sum_col += col as f64 * weight;
                sum_weight += weight;
            }
        }
    }

    if sum_weight > 0.0 {
        (sum_row / sum_weight, sum_col / sum_weight)
    } else {
        (
            (min_row + max_row) as f64 / 2.0,
            (min_col + max_col) as f64 / 2.0,
        )
    }
}
