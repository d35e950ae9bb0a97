//! Scale- and rotation-invariant triangle descriptors for star matching.

use crate::consts::{MIN_SIDE_SEPARATION, MIN_TRIANGLE_SIDE};
use crate::frame::Star;

use super::fit::PointPair;

/// A triangle over three stars of one frame.
#[derive(Clone, Debug)]
pub struct Triangle {
    /// Star indices ordered by the length of the opposite side, shortest
    /// first. Matching triangles correspond vertex by vertex.
    pub vertices: [usize; 3],
    /// `(s0 / s2, s1 / s2)` with sides sorted ascending.
    pub invariant: (f64, f64),
}

/// Centroids of the `limit` brightest stars, brightest first. Stars of
/// equal brightness keep their input order.
pub fn brightest_points(stars: &[Star], limit: usize) -> Vec<(f64, f64)> {
    let mut order: Vec<&Star> = stars.iter().collect();
    order.sort_by(|a, b| b.brightness.total_cmp(&a.brightness));
    order.into_iter().take(limit).map(|s| (s.x, s.y)).collect()
}

/// All well-conditioned triangles over `points`.
///
/// Triangles whose shortest side is under [`MIN_TRIANGLE_SIDE`], whose sorted
/// sides are too close to tell apart, or which are nearly collinear are
/// skipped.
pub fn build_triangles(points: &[(f64, f64)]) -> Vec<Triangle> {
    let n = points.len();
    let mut triangles = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                if let Some(t) = describe([i, j, k], points) {
                    triangles.push(t);
                }
            }
        }
    }
    triangles
}

fn describe(indices: [usize; 3], points: &[(f64, f64)]) -> Option<Triangle> {
    let side = |p: usize, q: usize| {
        let (a, b) = (points[p], points[q]);
        (a.0 - b.0).hypot(a.1 - b.1)
    };
    let [i, j, k] = indices;
    // (length of the side opposite the vertex, vertex)
    let mut opposite = [(side(j, k), i), (side(i, k), j), (side(i, j), k)];
    opposite.sort_by(|a, b| a.0.total_cmp(&b.0));
    let [(s0, v0), (s1, v1), (s2, v2)] = opposite;

    if s0 < MIN_TRIANGLE_SIDE {
        return None;
    }
    if (s1 - s0) / s2 < MIN_SIDE_SEPARATION || (s2 - s1) / s2 < MIN_SIDE_SEPARATION {
        return None;
    }
    if (s0 + s1 - s2) / s2 < MIN_SIDE_SEPARATION {
        return None;
    }

    Some(Triangle {
        vertices: [v0, v1, v2],
        invariant: (s0 / s2, s1 / s2),
    })
}

/// Pairs `(target_triangle, reference_triangle)` whose invariants lie within
/// `tolerance` of each other.
pub fn match_triangles(
    reference: &[Triangle],
    target: &[Triangle],
    tolerance: f64,
) -> Vec<(usize, usize)> {
    let mut order: Vec<usize> = (0..reference.len()).collect();
    order.sort_by(|&a, &b| reference[a].invariant.0.total_cmp(&reference[b].invariant.0));

    let mut matches = Vec::new();
    for (ti, t) in target.iter().enumerate() {
        let (u, v) = t.invariant;
        let start = order.partition_point(|&r| reference[r].invariant.0 < u - tolerance);
        for &ri in &order[start..] {
            let (ru, rv) = reference[ri].invariant;
            if ru > u + tolerance {
                break;
            }
            if (ru - u).hypot(rv - v) <= tolerance {
                matches.push((ti, ri));
            }
        }
    }
    matches
}

/// Vertex correspondences `(target_star, reference_star)` implied by one
/// triangle match.
pub fn vertex_pairs(target: &Triangle, reference: &Triangle) -> [(usize, usize); 3] {
    [
        (target.vertices[0], reference.vertices[0]),
        (target.vertices[1], reference.vertices[1]),
        (target.vertices[2], reference.vertices[2]),
    ]
}

/// Tally of how often each target star was paired with each reference star.
pub struct VoteTable {
    reference_len: usize,
    votes: Vec<u32>,
}

impl VoteTable {
    pub fn new(target_len: usize, reference_len: usize) -> Self {
        Self {
            reference_len,
            votes: vec![0; target_len * reference_len],
        }
    }

    pub fn cast(&mut self, target: usize, reference: usize) {
        self.votes[target * self.reference_len + reference] += 1;
    }

    fn get(&self, target: usize, reference: usize) -> u32 {
        self.votes[target * self.reference_len + reference]
    }

    fn target_len(&self) -> usize {
        if self.reference_len == 0 {
            0
        } else {
            self.votes.len() / self.reference_len
        }
    }

    /// Pairs that are each other's unique strongest vote.
    pub fn mutual_best(&self) -> Vec<(usize, usize)> {
        let targets = self.target_len();
        let best_for_target: Vec<Option<usize>> = (0..targets)
            .map(|t| unique_argmax((0..self.reference_len).map(|r| self.get(t, r))))
            .collect();
        let best_for_reference: Vec<Option<usize>> = (0..self.reference_len)
            .map(|r| unique_argmax((0..targets).map(|t| self.get(t, r))))
            .collect();

        best_for_target
            .iter()
            .enumerate()
            .filter_map(|(t, best)| {
                let r = (*best)?;
                (best_for_reference[r] == Some(t)).then_some((t, r))
            })
            .collect()
    }
}

/// Index of the single largest non-zero value, `None` on ties or all zero.
fn unique_argmax(values: impl Iterator<Item = u32>) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    let mut tied = false;
    for (i, v) in values.enumerate() {
        if v == 0 {
            continue;
        }
        match best {
            Some((_, b)) if v < b => {}
            Some((_, b)) if v == b => tied = true,
            _ => {
                best = Some((i, v));
                tied = false;
            }
        }
    }
    if tied {
        None
    } else {
        best.map(|(i, _)| i)
    }
}

/// Turn star index pairs into coordinate pairs for fitting.
pub fn to_point_pairs(
    pairs: &[(usize, usize)],
    target: &[(f64, f64)],
    reference: &[(f64, f64)],
) -> Vec<PointPair> {
    pairs
        .iter()
        .map(|&(t, r)| (target[t], reference[r]))
        .collect()
}
