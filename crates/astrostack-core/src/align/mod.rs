pub mod config;
pub mod consensus;
mod dispatcher;
pub mod dumb;
pub mod fit;
pub mod phase_correlation;
pub mod planetary;
pub mod standard;
pub mod transform;
pub mod triangles;

pub use config::{AlignmentMethod, ConsensusConfig, DumbConfig, PlanetaryConfig, StandardConfig};
pub use dispatcher::{align, Aligner};
pub use fit::FitModel;
pub use transform::Transform;

use crate::error::AlignFailure;

/// Outcome of aligning one frame against the reference.
#[derive(Clone, Debug, PartialEq)]
pub enum AlignmentResult {
    Aligned { transform: Transform, confidence: f64 },
    Failed { reason: AlignFailure },
}

impl AlignmentResult {
    pub fn failed(reason: AlignFailure) -> Self {
        Self::Failed { reason }
    }

    pub fn is_aligned(&self) -> bool {
        matches!(self, Self::Aligned { .. })
    }

    pub fn transform(&self) -> Option<&Transform> {
        match self {
            Self::Aligned { transform, .. } => Some(transform),
            Self::Failed { .. } => None,
        }
    }

    /// Strategy-specific confidence; 0 for a failed result.
    pub fn confidence(&self) -> f64 {
        match self {
            Self::Aligned { confidence, .. } => *confidence,
            Self::Failed { .. } => 0.0,
        }
    }
}
