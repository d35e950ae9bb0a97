use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::consts::MIN_CORRESPONDENCES;
use crate::error::AlignFailure;
use crate::frame::Star;

use super::config::ConsensusConfig;
use super::fit::{fit_similarity, PointPair};
use super::transform::Transform;
use super::triangles::{
    brightest_points, build_triangles, match_triangles, to_point_pairs, vertex_pairs,
};
use super::AlignmentResult;

/// Stars of both frames that agree with one candidate transform.
struct Agreement {
    inliers: Vec<PointPair>,
    residual_sum: f64,
}

impl Agreement {
    fn count(&self) -> usize {
        self.inliers.len()
    }

    /// More inliers wins; ties go to the tighter fit.
    fn beats(&self, other: &Agreement) -> bool {
        self.count() > other.count()
            || (self.count() == other.count() && self.residual_sum < other.residual_sum)
    }
}

/// Hypothesise-and-score alignment.
///
/// Each triangle match is a minimal correspondence set that fixes a
/// similarity transform. Candidates are scored against the full star lists
/// of both frames; the best one is refit on the stars that agree with it.
/// All matches are scored when there are at most `config.iterations` of them,
/// otherwise that many are drawn with a seeded RNG.
pub fn align_consensus(
    reference: &[Star],
    target: &[Star],
    config: &ConsensusConfig,
) -> AlignmentResult {
    let required = config.min_inliers.max(MIN_CORRESPONDENCES);
    for stars in [reference, target] {
        if stars.len() < required {
            return AlignmentResult::failed(AlignFailure::TooFewStars {
                found: stars.len(),
                required,
            });
        }
    }

    let ref_points = brightest_points(reference, config.max_stars);
    let tgt_points = brightest_points(target, config.max_stars);
    let all_ref = brightest_points(reference, reference.len());
    let all_tgt = brightest_points(target, target.len());

    let ref_triangles = build_triangles(&ref_points);
    let tgt_triangles = build_triangles(&tgt_points);
    let matches = match_triangles(&ref_triangles, &tgt_triangles, config.triangle_tolerance);
    if matches.is_empty() {
        return AlignmentResult::failed(AlignFailure::NoConsensus { best: 0, required });
    }

    let hypotheses: Vec<usize> = if matches.len() <= config.iterations {
        (0..matches.len()).collect()
    } else {
        let mut rng = StdRng::seed_from_u64(config.seed);
        (0..config.iterations)
            .map(|_| rng.random_range(0..matches.len()))
            .collect()
    };

    let mut best: Option<(Transform, Agreement)> = None;
    for &m in &hypotheses {
        let (ti, ri) = matches[m];
        let pairs = to_point_pairs(
            &vertex_pairs(&tgt_triangles[ti], &ref_triangles[ri]),
            &tgt_points,
            &ref_points,
        );
        let Some(candidate) = fit_similarity(&pairs) else {
            continue;
        };
        let agreement = agree(&candidate, &all_tgt, &all_ref, config.tolerance);
        if best.as_ref().map_or(true, |(_, b)| agreement.beats(b)) {
            best = Some((candidate, agreement));
        }
    }

    let Some((mut transform, mut agreement)) = best else {
        return AlignmentResult::failed(AlignFailure::DegenerateFit);
    };
    debug!(
        triangle_matches = matches.len(),
        scored = hypotheses.len(),
        best = agreement.count(),
        "Consensus search complete"
    );

    if agreement.count() < required {
        return AlignmentResult::failed(AlignFailure::NoConsensus {
            best: agreement.count(),
            required,
        });
    }

    if let Some(refined) = fit_similarity(&agreement.inliers) {
        let refined_agreement = agree(&refined, &all_tgt, &all_ref, config.tolerance);
        if refined_agreement.count() >= agreement.count() {
            transform = refined;
            agreement = refined_agreement;
        }
    }

    AlignmentResult::Aligned {
        transform,
        confidence: agreement.count() as f64,
    }
}

/// Greedily pair each mapped target star with the nearest unclaimed
/// reference star within `tolerance`.
fn agree(
    transform: &Transform,
    target: &[(f64, f64)],
    reference: &[(f64, f64)],
    tolerance: f64,
) -> Agreement {
    let mut claimed = vec![false; reference.len()];
    let mut inliers = Vec::new();
    let mut residual_sum = 0.0;

    for &(x, y) in target {
        let (px, py) = transform.apply(x, y);
        let nearest = reference
            .iter()
            .enumerate()
            .filter(|(i, _)| !claimed[*i])
            .map(|(i, &(rx, ry))| (i, (rx - px).hypot(ry - py)))
            .filter(|&(_, d)| d <= tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((i, d)) = nearest {
            claimed[i] = true;
            inliers.push(((x, y), reference[i]));
            residual_sum += d;
        }
    }

    Agreement {
        inliers,
        residual_sum,
    }
}
