use ndarray::Array2;
use tracing::debug;

use crate::frame::{Frame, Star, StarSource};

use super::blobs::{brightness_map, extract_blobs, is_extended_structure, Blob};
use super::config::StarDetectionConfig;

/// Detect stars in a frame with the default configuration and the given
/// brightness threshold.
pub fn detect(frame: &Frame, threshold: f32) -> Vec<Star> {
    let config = StarDetectionConfig {
        threshold,
        ..Default::default()
    };
    detect_stars(frame, &config)
}

/// Detect stars in a frame.
///
/// Stars are returned brightest first.
pub fn detect_stars(frame: &Frame, config: &StarDetectionConfig) -> Vec<Star> {
    let map = brightness_map(frame);
    detect_stars_in_map(&map, config)
}

/// Detect stars in a precomputed brightness map.
pub fn detect_stars_in_map(map: &Array2<f32>, config: &StarDetectionConfig) -> Vec<Star> {
    let blobs = extract_blobs(map, config.threshold);
    let candidates = blobs.len();

    let mut stars: Vec<Star> = blobs
        .iter()
        .filter(|blob| blob.size() >= config.min_size)
        .filter(|blob| config.max_size.map_or(true, |max| blob.size() <= max))
        .filter(|blob| {
            !is_extended_structure(map, blob, config.surround_radius, config.saturation_threshold)
        })
        .map(star_from_blob)
        .collect();

    stars.sort_by(|a, b| b.brightness.total_cmp(&a.brightness));
    if let Some(max) = config.max_stars {
        stars.truncate(max);
    }

    debug!(
        candidates,
        accepted = stars.len(),
        threshold = config.threshold,
        "Star detection complete"
    );
    stars
}

fn star_from_blob(blob: &Blob) -> Star {
    Star {
        x: blob.x,
        y: blob.y,
        brightness: blob.brightness,
        size: blob.size(),
        fwhm: Some(2.0 * blob.equivalent_radius()),
        elongation: blob.elongation(),
        source: StarSource::Detected,
    }
}
