use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_DISC_BLUR_SIGMA, DEFAULT_DISC_MIN_AREA, DEFAULT_SATURATION_THRESHOLD,
    DEFAULT_STAR_THRESHOLD, DEFAULT_SURROUND_RADIUS,
};

/// Configuration for point-source detection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StarDetectionConfig {
    /// Brightness (fraction of full scale) a pixel must exceed to belong to a star.
    #[serde(default = "default_star_threshold")]
    pub threshold: f32,
    /// Radius (px) of the neighbourhood sampled around each candidate.
    #[serde(default = "default_surround_radius")]
    pub surround_radius: f64,
    /// Candidates whose neighbourhood mean exceeds this are extended structure.
    #[serde(default = "default_saturation_threshold")]
    pub saturation_threshold: f32,
    /// Smallest accepted star, in pixels.
    #[serde(default = "default_min_size")]
    pub min_size: usize,
    /// Largest accepted star, in pixels.
    #[serde(default)]
    pub max_size: Option<usize>,
    /// Keep only this many of the brightest stars.
    #[serde(default)]
    pub max_stars: Option<usize>,
}

fn default_star_threshold() -> f32 {
    DEFAULT_STAR_THRESHOLD
}
fn default_surround_radius() -> f64 {
    DEFAULT_SURROUND_RADIUS
}
fn default_saturation_threshold() -> f32 {
    DEFAULT_SATURATION_THRESHOLD
}
fn default_min_size() -> usize {
    1
}

impl Default for StarDetectionConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_STAR_THRESHOLD,
            surround_radius: DEFAULT_SURROUND_RADIUS,
            saturation_threshold: DEFAULT_SATURATION_THRESHOLD,
            min_size: 1,
            max_size: None,
            max_stars: None,
        }
    }
}

/// Method used to separate a planetary disc from the sky background.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum ThresholdMethod {
    /// Threshold = mean + sigma_multiplier * stddev.
    MeanPlusSigma,
    /// Otsu's method: maximises between-class variance of a bimodal histogram.
    #[default]
    Otsu,
    /// User-specified fixed threshold in [0.0, 1.0].
    Fixed(f32),
}

/// Configuration for finding the disc in a planetary frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiscDetectionConfig {
    #[serde(default)]
    pub threshold_method: ThresholdMethod,
    /// Sigma multiplier for the MeanPlusSigma method.
    #[serde(default = "default_sigma_multiplier")]
    pub sigma_multiplier: f32,
    /// Gaussian blur sigma for noise suppression before thresholding.
    #[serde(default = "default_blur_sigma")]
    pub blur_sigma: f32,
    /// Minimum component area (px) to count as a disc.
    #[serde(default = "default_min_area")]
    pub min_area: usize,
}

fn default_sigma_multiplier() -> f32 {
    2.0
}
fn default_blur_sigma() -> f32 {
    DEFAULT_DISC_BLUR_SIGMA
}
fn default_min_area() -> usize {
    DEFAULT_DISC_MIN_AREA
}

impl Default for DiscDetectionConfig {
    fn default() -> Self {
        Self {
            threshold_method: ThresholdMethod::default(),
            sigma_multiplier: default_sigma_multiplier(),
            blur_sigma: DEFAULT_DISC_BLUR_SIGMA,
            min_area: DEFAULT_DISC_MIN_AREA,
        }
    }
}
