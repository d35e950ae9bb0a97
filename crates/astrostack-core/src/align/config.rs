use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_CONSENSUS_ITERATIONS, DEFAULT_CONSENSUS_SEED, DEFAULT_MATCH_TOLERANCE,
    DEFAULT_MIN_CORRELATION_CONFIDENCE, DEFAULT_PLANETARY_QUALITY, DEFAULT_TRIANGLE_STARS,
    DEFAULT_TRIANGLE_TOLERANCE, MIN_CORRESPONDENCES,
};
use crate::detection::DiscDetectionConfig;

use super::fit::FitModel;

/// Alignment strategy and its parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum AlignmentMethod {
    /// Triangle-invariant star matching with iterative outlier rejection.
    Standard(StandardConfig),
    /// Hypothesise-and-score over triangle matches.
    Consensus(ConsensusConfig),
    /// Disc centre (and optionally rotation) of an extended planetary disc.
    Planetary(PlanetaryConfig),
    /// Whole-frame phase correlation, translation only.
    Dumb(DumbConfig),
}

impl Default for AlignmentMethod {
    fn default() -> Self {
        Self::Standard(StandardConfig::default())
    }
}

impl std::fmt::Display for AlignmentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard(_) => write!(f, "Standard (triangle matching)"),
            Self::Consensus(_) => write!(f, "Consensus (hypothesis scoring)"),
            Self::Planetary(p) => write!(f, "Planetary (quality {})", p.quality),
            Self::Dumb(_) => write!(f, "Dumb (phase correlation)"),
        }
    }
}

impl AlignmentMethod {
    /// Whether this strategy consumes per-frame star lists.
    pub fn uses_stars(&self) -> bool {
        matches!(self, Self::Standard(_) | Self::Consensus(_))
    }

    /// Override the planetary limb quality; other strategies ignore it.
    pub fn with_quality(mut self, quality: Option<u8>) -> Self {
        if let (Self::Planetary(config), Some(q)) = (&mut self, quality) {
            config.quality = q.min(100);
        }
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardConfig {
    /// Brightest stars per frame used to build triangles.
    #[serde(default = "default_triangle_stars")]
    pub max_stars: usize,
    /// Match radius in triangle-invariant space.
    #[serde(default = "default_triangle_tolerance")]
    pub triangle_tolerance: f64,
    /// Residual (px) above which a correspondence is dropped.
    #[serde(default = "default_match_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_min_matches")]
    pub min_matches: usize,
    #[serde(default)]
    pub model: FitModel,
}

impl Default for StandardConfig {
    fn default() -> Self {
        Self {
            max_stars: DEFAULT_TRIANGLE_STARS,
            triangle_tolerance: DEFAULT_TRIANGLE_TOLERANCE,
            tolerance: DEFAULT_MATCH_TOLERANCE,
            min_matches: MIN_CORRESPONDENCES,
            model: FitModel::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsensusConfig {
    #[serde(default = "default_triangle_stars")]
    pub max_stars: usize,
    #[serde(default = "default_triangle_tolerance")]
    pub triangle_tolerance: f64,
    /// Distance (px) within which a mapped target star agrees with a
    /// reference star.
    #[serde(default = "default_match_tolerance")]
    pub tolerance: f64,
    /// Upper bound on scored hypotheses.
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    #[serde(default = "default_min_matches")]
    pub min_inliers: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            max_stars: DEFAULT_TRIANGLE_STARS,
            triangle_tolerance: DEFAULT_TRIANGLE_TOLERANCE,
            tolerance: DEFAULT_MATCH_TOLERANCE,
            iterations: DEFAULT_CONSENSUS_ITERATIONS,
            min_inliers: MIN_CORRESPONDENCES,
            seed: DEFAULT_CONSENSUS_SEED,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanetaryConfig {
    /// Limb refinement effort, 0-100.
    #[serde(default = "default_quality")]
    pub quality: u8,
    /// Also estimate the disc rotation from angular brightness profiles.
    #[serde(default)]
    pub estimate_rotation: bool,
    #[serde(default)]
    pub disc: DiscDetectionConfig,
}

impl Default for PlanetaryConfig {
    fn default() -> Self {
        Self {
            quality: DEFAULT_PLANETARY_QUALITY,
            estimate_rotation: false,
            disc: DiscDetectionConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DumbConfig {
    /// Minimum correlation peak-to-mean ratio; below it the frame is assumed
    /// aligned already.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    /// Shifts larger than this (px) are treated as spurious.
    #[serde(default)]
    pub max_shift: Option<f64>,
}

impl Default for DumbConfig {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CORRELATION_CONFIDENCE,
            max_shift: None,
        }
    }
}

fn default_triangle_stars() -> usize {
    DEFAULT_TRIANGLE_STARS
}
fn default_triangle_tolerance() -> f64 {
    DEFAULT_TRIANGLE_TOLERANCE
}
fn default_match_tolerance() -> f64 {
    DEFAULT_MATCH_TOLERANCE
}
fn default_min_matches() -> usize {
    MIN_CORRESPONDENCES
}
fn default_iterations() -> usize {
    DEFAULT_CONSENSUS_ITERATIONS
}
fn default_seed() -> u64 {
    DEFAULT_CONSENSUS_SEED
}
fn default_quality() -> u8 {
    DEFAULT_PLANETARY_QUALITY
}
fn default_min_confidence() -> f64 {
    DEFAULT_MIN_CORRELATION_CONFIDENCE
}
