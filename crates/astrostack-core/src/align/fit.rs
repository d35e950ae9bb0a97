//! Least-squares transform estimation from point correspondences.

use serde::{Deserialize, Serialize};

use super::transform::Transform;

/// A correspondence: a point in the target frame and where it lies in the
/// reference frame.
pub type PointPair = ((f64, f64), (f64, f64));

/// Spread (sum of squared distances to the centroid) below which a point set
/// cannot constrain rotation or scale.
const MIN_SPREAD: f64 = 1e-9;

/// Degrees of freedom of the fitted transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitModel {
    /// Uniform scale, rotation, translation (4 parameters).
    #[default]
    Similarity,
    /// Full affine map, independent x/y scale and shear (6 parameters).
    Affine,
}

impl std::fmt::Display for FitModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Similarity => write!(f, "Similarity"),
            Self::Affine => write!(f, "Affine"),
        }
    }
}

/// Fit the configured model, or `None` if the pairs are degenerate.
pub fn fit(pairs: &[PointPair], model: FitModel) -> Option<Transform> {
    match model {
        FitModel::Similarity => fit_similarity(pairs),
        FitModel::Affine => fit_affine(pairs),
    }
}

/// Closed-form least-squares similarity fit.
///
/// Needs at least two distinct source points.
pub fn fit_similarity(pairs: &[PointPair]) -> Option<Transform> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let (mut mx, mut my, mut nx, mut ny) = (0.0, 0.0, 0.0, 0.0);
    for &((sx, sy), (dx, dy)) in pairs {
        mx += sx;
        my += sy;
        nx += dx;
        ny += dy;
    }
    let (mx, my, nx, ny) = (mx / n, my / n, nx / n, ny / n);

    let (mut spread, mut dot, mut cross) = (0.0, 0.0, 0.0);
    for &((sx, sy), (dx, dy)) in pairs {
        let (u, v) = (sx - mx, sy - my);
        let (p, q) = (dx - nx, dy - ny);
        spread += u * u + v * v;
        dot += u * p + v * q;
        cross += u * q - v * p;
    }
    if spread < MIN_SPREAD {
        return None;
    }

    let a = dot / spread;
    let c = cross / spread;
    let t = Transform {
        a,
        b: -c,
        c,
        d: a,
        tx: nx - (a * mx - c * my),
        ty: ny - (c * mx + a * my),
    };
    (t.is_finite() && t.inverse().is_some()).then_some(t)
}

/// Least-squares affine fit via the 3x3 normal equations.
///
/// Needs at least three non-collinear source points.
pub fn fit_affine(pairs: &[PointPair]) -> Option<Transform> {
    if pairs.len() < 3 {
        return None;
    }
    // Normal matrix of [x y 1] rows and the two right-hand sides.
    let mut m = [[0.0f64; 3]; 3];
    let mut rhs_x = [0.0f64; 3];
    let mut rhs_y = [0.0f64; 3];
    for &((sx, sy), (dx, dy)) in pairs {
        let row = [sx, sy, 1.0];
        for i in 0..3 {
            for j in 0..3 {
                m[i][j] += row[i] * row[j];
            }
            rhs_x[i] += row[i] * dx;
            rhs_y[i] += row[i] * dy;
        }
    }

    let [a, b, tx] = solve3(&m, &rhs_x)?;
    let [c, d, ty] = solve3(&m, &rhs_y)?;
    let t = Transform { a, b, c, d, tx, ty };
    (t.is_finite() && t.inverse().is_some()).then_some(t)
}

/// Euclidean distance between each mapped target point and its reference.
pub fn residuals(transform: &Transform, pairs: &[PointPair]) -> Vec<f64> {
    pairs
        .iter()
        .map(|&((sx, sy), (dx, dy))| {
            let (px, py) = transform.apply(sx, sy);
            (px - dx).hypot(py - dy)
        })
        .collect()
}

/// Cramer's rule for a 3x3 system.
pub(crate) fn solve3(m: &[[f64; 3]; 3], rhs: &[f64; 3]) -> Option<[f64; 3]> {
    let det = det3(m);
    if det.abs() < MIN_SPREAD {
        return None;
    }
    let mut out = [0.0; 3];
    for (col, slot) in out.iter_mut().enumerate() {
        let mut replaced = *m;
        for row in 0..3 {
            replaced[row][col] = rhs[row];
        }
        *slot = det3(&replaced) / det;
    }
    Some(out)
}

fn det3(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapped(t: &Transform, pts: &[(f64, f64)]) -> Vec<PointPair> {
        pts.iter().map(|&(x, y)| ((x, y), t.apply(x, y))).collect()
    }

    #[test]
    fn similarity_recovers_exact_transform() {
        let truth = Transform::similarity(0.98, 0.05, 12.0, -7.5);
        let pairs = mapped(&truth, &[(10.0, 10.0), (80.0, 15.0), (40.0, 70.0), (5.0, 50.0)]);
        let t = fit_similarity(&pairs).unwrap();
        assert!((t.a - truth.a).abs() < 1e-9);
        assert!((t.c - truth.c).abs() < 1e-9);
        assert!((t.tx - truth.tx).abs() < 1e-6);
        assert!((t.ty - truth.ty).abs() < 1e-6);
    }

    #[test]
    fn affine_recovers_independent_scales() {
        let truth = Transform::scaled(1.1, 0.9, 0.0, 3.0, 4.0);
        let pairs = mapped(&truth, &[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (7.0, 3.0)]);
        let t = fit_affine(&pairs).unwrap();
        assert!((t.a - 1.1).abs() < 1e-9);
        assert!((t.d - 0.9).abs() < 1e-9);
    }

    #[test]
    fn coincident_points_are_degenerate() {
        let pairs = vec![((1.0, 1.0), (2.0, 2.0)), ((1.0, 1.0), (2.0, 2.0))];
        assert!(fit_similarity(&pairs).is_none());
    }
}
