//! Connected-component extraction over a brightness map.
//!
//! A blob is an 8-connected set of pixels brighter than a threshold. Regions
//! are grown by breadth-first flood fill from each unvisited seed pixel; a
//! flat visited bitmap indexed by pixel offset keeps every pixel to a single
//! visit. The same primitive drives star detection and star removal.

use std::collections::VecDeque;

use ndarray::Array2;
use rayon::prelude::*;

use crate::consts::{COLOR_CHANNELS, PARALLEL_PIXEL_THRESHOLD};
use crate::frame::Frame;

/// Offsets of the 8-connected neighbourhood, as (d_row, d_col).
const NEIGHBOURS_8: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Variance of a uniform unit square along one axis. Added to the second
/// moments so that single-pixel and single-row blobs keep a finite shape.
const PIXEL_VARIANCE: f64 = 1.0 / 12.0;

/// A bright connected region.
#[derive(Clone, Debug)]
pub struct Blob {
    /// Pixel offsets (`row * width + col`) belonging to the region.
    pub pixels: Vec<usize>,
    /// Brightness-weighted centroid column.
    pub x: f64,
    /// Brightness-weighted centroid row.
    pub y: f64,
    /// Summed brightness of all member pixels.
    pub brightness: f64,
    /// Brightness-weighted central moments (xx, yy, xy).
    pub moments: (f64, f64, f64),
}

impl Blob {
    pub fn size(&self) -> usize {
        self.pixels.len()
    }

    /// Radius of a disc with the same pixel count.
    pub fn equivalent_radius(&self) -> f64 {
        (self.size() as f64 / std::f64::consts::PI).sqrt()
    }

    /// Ratio of the major to the minor axis of the moment ellipse.
    pub fn elongation(&self) -> f64 {
        let (xx, yy, xy) = self.moments;
        let (xx, yy) = (xx + PIXEL_VARIANCE, yy + PIXEL_VARIANCE);
        let disc = ((xx - yy).powi(2) + 4.0 * xy * xy).sqrt();
        let major = (xx + yy + disc).max(0.0).sqrt();
        let minor = (xx + yy - disc).max(0.0).sqrt();
        if minor > 0.0 {
            major / minor
        } else {
            f64::INFINITY
        }
    }
}

/// Per-pixel mean of the R, G and B channels.
pub fn brightness_map(frame: &Frame) -> Array2<f32> {
    let (h, w, _) = frame.data.dim();
    let data = &frame.data;
    let mean_at = |row: usize, col: usize| {
        (0..COLOR_CHANNELS).map(|ch| data[[row, col, ch]]).sum::<f32>() / COLOR_CHANNELS as f32
    };

    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        let values: Vec<f32> = (0..h)
            .into_par_iter()
            .flat_map_iter(|row| (0..w).map(move |col| mean_at(row, col)))
            .collect();
        Array2::from_shape_vec((h, w), values).unwrap_or_else(|_| Array2::zeros((h, w)))
    } else {
        Array2::from_shape_fn((h, w), |(row, col)| mean_at(row, col))
    }
}

/// Find all 8-connected regions whose brightness exceeds `threshold`.
///
/// Regions are returned in scan order of their first pixel. A region whose
/// total brightness is zero has no centroid and is dropped.
pub fn extract_blobs(map: &Array2<f32>, threshold: f32) -> Vec<Blob> {
    let (h, w) = map.dim();
    let values: Vec<f32> = map.iter().copied().collect();

    flood_regions(h, w, |idx| values[idx] > threshold)
        .into_iter()
        .filter_map(|pixels| describe_region(pixels, &values, w))
        .collect()
}

/// Breadth-first 8-connected labelling of the pixels selected by `member`.
///
/// Returns one list of pixel offsets per region.
pub(crate) fn flood_regions<F>(height: usize, width: usize, member: F) -> Vec<Vec<usize>>
where
    F: Fn(usize) -> bool,
{
    let mut visited = vec![false; height * width];
    let mut queue = VecDeque::new();
    let mut regions = Vec::new();

    for seed in 0..height * width {
        if visited[seed] || !member(seed) {
            continue;
        }
        visited[seed] = true;
        queue.push_back(seed);
        let mut region = Vec::new();

        while let Some(idx) = queue.pop_front() {
            region.push(idx);
            let row = (idx / width) as isize;
            let col = (idx % width) as isize;
            for (dr, dc) in NEIGHBOURS_8 {
                let (nr, nc) = (row + dr, col + dc);
                if nr < 0 || nc < 0 || nr >= height as isize || nc >= width as isize {
                    continue;
                }
                let n = nr as usize * width + nc as usize;
                if !visited[n] && member(n) {
                    visited[n] = true;
                    queue.push_back(n);
                }
            }
        }
        regions.push(region);
    }

    regions
}

fn describe_region(pixels: Vec<usize>, values: &[f32], width: usize) -> Option<Blob> {
    let mut sum = 0.0f64;
    let mut sum_x = 0.0f64;
    let mut sum_y = 0.0f64;
    for &idx in &pixels {
        let b = values[idx] as f64;
        sum += b;
        sum_x += (idx % width) as f64 * b;
        sum_y += (idx / width) as f64 * b;
    }
    if sum <= 0.0 {
        return None;
    }
    let (cx, cy) = (sum_x / sum, sum_y / sum);

    let (mut xx, mut yy, mut xy) = (0.0f64, 0.0f64, 0.0f64);
    for &idx in &pixels {
        let b = values[idx] as f64;
        let dx = (idx % width) as f64 - cx;
        let dy = (idx / width) as f64 - cy;
        xx += dx * dx * b;
        yy += dy * dy * b;
        xy += dx * dy * b;
    }

    Some(Blob {
        pixels,
        x: cx,
        y: cy,
        brightness: sum,
        moments: (xx / sum, yy / sum, xy / sum),
    })
}

/// Mean brightness of the pixels within `radius` of `(x, y)`.
///
/// The disc is clipped to the image; an empty intersection yields 0.
pub fn surrounding_mean(map: &Array2<f32>, x: f64, y: f64, radius: f64) -> f32 {
    let (h, w) = map.dim();
    if h == 0 || w == 0 {
        return 0.0;
    }
    let r2 = radius * radius;
    let row_lo = (y - radius).floor().max(0.0) as usize;
    let row_hi = ((y + radius).ceil().max(0.0) as usize).min(h - 1);
    let col_lo = (x - radius).floor().max(0.0) as usize;
    let col_hi = ((x + radius).ceil().max(0.0) as usize).min(w - 1);

    let mut sum = 0.0f64;
    let mut count = 0usize;
    for row in row_lo..=row_hi {
        let dy = row as f64 - y;
        for col in col_lo..=col_hi {
            let dx = col as f64 - x;
            if dx * dx + dy * dy <= r2 {
                sum += map[[row, col]] as f64;
                count += 1;
            }
        }
    }

    if count == 0 {
        0.0
    } else {
        (sum / count as f64) as f32
    }
}

/// True when the neighbourhood of `blob` is too bright for it to be a star.
///
/// Nebula cores and planetary discs stay bright well beyond a star's
/// footprint, so their surrounding mean exceeds `saturation_threshold`.
pub fn is_extended_structure(
    map: &Array2<f32>,
    blob: &Blob,
    radius: f64,
    saturation_threshold: f32,
) -> bool {
    surrounding_mean(map, blob.x, blob.y, radius) > saturation_threshold
}
