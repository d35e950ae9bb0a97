use ndarray::{s, Array2};
use tracing::debug;

use crate::error::AlignFailure;

use super::config::DumbConfig;
use super::phase_correlation::phase_correlate;
use super::transform::Transform;
use super::AlignmentResult;

/// Translation-only alignment by phase correlation over the region both
/// brightness maps cover.
///
/// Frames are assumed to be nearly aligned already: a weak correlation peak,
/// or a shift beyond `config.max_shift`, yields the identity.
pub fn align_dumb(reference: &Array2<f32>, target: &Array2<f32>, config: &DumbConfig) -> AlignmentResult {
    let (rh, rw) = reference.dim();
    let (th, tw) = target.dim();
    let (h, w) = (rh.min(th), rw.min(tw));
    if h == 0 || w == 0 {
        return AlignmentResult::failed(AlignFailure::EmptyFrame);
    }

    let Some(peak) = phase_correlate(
        reference.slice(s![..h, ..w]),
        target.slice(s![..h, ..w]),
    ) else {
        return AlignmentResult::failed(AlignFailure::EmptyFrame);
    };

    let too_far = config
        .max_shift
        .is_some_and(|max| peak.dx.hypot(peak.dy) > max);
    if peak.confidence < config.min_confidence || too_far {
        debug!(
            confidence = peak.confidence,
            dx = peak.dx,
            dy = peak.dy,
            "Correlation not trusted, keeping frame in place"
        );
        return AlignmentResult::Aligned {
            transform: Transform::identity(),
            confidence: peak.confidence,
        };
    }

    AlignmentResult::Aligned {
        transform: Transform::translation(peak.dx, peak.dy),
        confidence: peak.confidence,
    }
}
