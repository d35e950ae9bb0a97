use tracing::debug;

use crate::consts::MIN_CORRESPONDENCES;
use crate::error::AlignFailure;
use crate::frame::Star;

use super::config::StandardConfig;
use super::fit::{fit, residuals};
use super::triangles::{
    brightest_points, build_triangles, match_triangles, to_point_pairs, vertex_pairs, VoteTable,
};
use super::AlignmentResult;

/// Triangle-invariant star matching.
///
/// Every matched triangle pair votes for its three vertex correspondences.
/// Pairs that are each other's unique best vote are fitted; the pair with
/// the largest residual is dropped and the fit repeated until every residual
/// is within `config.tolerance`.
pub fn align_standard(reference: &[Star], target: &[Star], config: &StandardConfig) -> AlignmentResult {
    let required = config.min_matches.max(MIN_CORRESPONDENCES);
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
    let ref_triangles = build_triangles(&ref_points);
    let tgt_triangles = build_triangles(&tgt_points);
    let matches = match_triangles(&ref_triangles, &tgt_triangles, config.triangle_tolerance);

    let mut votes = VoteTable::new(tgt_points.len(), ref_points.len());
    for &(ti, ri) in &matches {
        for (t, r) in vertex_pairs(&tgt_triangles[ti], &ref_triangles[ri]) {
            votes.cast(t, r);
        }
    }
    let correspondences = votes.mutual_best();
    debug!(
        triangles = tgt_triangles.len(),
        triangle_matches = matches.len(),
        correspondences = correspondences.len(),
        "Triangle voting complete"
    );

    if correspondences.len() < required {
        return AlignmentResult::failed(AlignFailure::TooFewMatches {
            found: correspondences.len(),
            required,
        });
    }

    let mut pairs = to_point_pairs(&correspondences, &tgt_points, &ref_points);
    loop {
        let Some(transform) = fit(&pairs, config.model) else {
            return AlignmentResult::failed(AlignFailure::DegenerateFit);
        };
        let errors = residuals(&transform, &pairs);
        let (worst, worst_error) = errors
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((0, 0.0));

        if worst_error <= config.tolerance {
            return AlignmentResult::Aligned {
                transform,
                confidence: pairs.len() as f64,
            };
        }

        pairs.swap_remove(worst);
        if pairs.len() < required {
            return AlignmentResult::failed(AlignFailure::TooFewMatches {
                found: pairs.len(),
                required,
            });
        }
    }
}
