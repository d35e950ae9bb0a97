use std::f64::consts::TAU;

use ndarray::Array2;
use tracing::debug;

use crate::consts::{EPSILON, ROTATION_PROFILE_BINS};
use crate::detection::{detect_disc, Disc};
use crate::error::AlignFailure;
use crate::filters::gaussian_blur::gaussian_blur_map;

use super::config::PlanetaryConfig;
use super::fit::solve3;
use super::transform::Transform;
use super::AlignmentResult;

/// Limb search band, as fractions of the detected disc radius.
const LIMB_BAND: (f64, f64) = (0.6, 1.4);

/// Angular profiles sample this annulus of the disc.
const PROFILE_BAND: (f64, f64) = (0.2, 0.8);

/// Disc centre refined by a circle fit to its limb.
#[derive(Clone, Copy, Debug)]
pub struct LimbFit {
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
    /// Edge pixels used by the last accepted fit; 0 if the fit never
    /// converged and the disc centroid was kept.
    pub points: usize,
}

/// Limb pass parameters derived from the 0-100 quality knob.
#[derive(Clone, Copy, Debug)]
struct LimbParams {
    smoothing: f32,
    edge_fraction: f32,
    iterations: usize,
}

impl LimbParams {
    fn from_quality(quality: u8) -> Self {
        let q = quality.min(100) as f32 / 100.0;
        Self {
            smoothing: 0.5 + 1.5 * q,
            edge_fraction: 0.6 - 0.4 * q,
            iterations: 1 + (3.0 * q).round() as usize,
        }
    }
}

/// Align two frames of an extended disc by its limb-fitted centre.
pub fn align_planetary(
    reference: &Array2<f32>,
    target: &Array2<f32>,
    config: &PlanetaryConfig,
) -> AlignmentResult {
    let Some(ref_disc) = detect_disc(reference, &config.disc) else {
        return AlignmentResult::failed(AlignFailure::DiscNotFound("reference"));
    };
    let Some(tgt_disc) = detect_disc(target, &config.disc) else {
        return AlignmentResult::failed(AlignFailure::DiscNotFound("target"));
    };

    let params = LimbParams::from_quality(config.quality);
    let ref_limb = refine_centre(reference, &ref_disc, params);
    let tgt_limb = refine_centre(target, &tgt_disc, params);

    let rotation = if config.estimate_rotation {
        let ref_profile = angular_profile(reference, &ref_limb);
        let tgt_profile = angular_profile(target, &tgt_limb);
        profile_rotation(&ref_profile, &tgt_profile)
    } else {
        0.0
    };

    debug!(
        ref_cx = ref_limb.cx,
        ref_cy = ref_limb.cy,
        tgt_cx = tgt_limb.cx,
        tgt_cy = tgt_limb.cy,
        rotation_deg = rotation.to_degrees(),
        "Planetary limb fit"
    );

    // Rotate about the target centre, then move it onto the reference centre.
    let linear = Transform::similarity(1.0, -rotation, 0.0, 0.0);
    let (rx, ry) = linear.apply(tgt_limb.cx, tgt_limb.cy);
    let transform = Transform {
        tx: ref_limb.cx - rx,
        ty: ref_limb.cy - ry,
        ..linear
    };

    AlignmentResult::Aligned {
        transform,
        confidence: ref_limb.points.min(tgt_limb.points) as f64,
    }
}

/// Refine the disc centre by repeatedly fitting a circle to the strongest
/// gradient pixels in a band around the current limb estimate.
fn refine_centre(map: &Array2<f32>, disc: &Disc, params: LimbParams) -> LimbFit {
    let smoothed = gaussian_blur_map(map, params.smoothing);
    let gradient = sobel_magnitude(&smoothed);
    let (h, w) = gradient.dim();

    let mut fit = LimbFit {
        cx: disc.cx,
        cy: disc.cy,
        radius: disc.radius,
        points: 0,
    };

    for _ in 0..params.iterations {
        let (inner, outer) = (fit.radius * LIMB_BAND.0, fit.radius * LIMB_BAND.1);
        let row_lo = (fit.cy - outer).floor().max(0.0) as usize;
        let row_hi = ((fit.cy + outer).ceil().max(0.0) as usize).min(h.saturating_sub(1));
        let col_lo = (fit.cx - outer).floor().max(0.0) as usize;
        let col_hi = ((fit.cx + outer).ceil().max(0.0) as usize).min(w.saturating_sub(1));

        let mut band = Vec::new();
        for row in row_lo..=row_hi {
            for col in col_lo..=col_hi {
                let r = (col as f64 - fit.cx).hypot(row as f64 - fit.cy);
                if r >= inner && r <= outer {
                    band.push((col as f64, row as f64, gradient[[row, col]]));
                }
            }
        }
        let peak = band.iter().map(|p| p.2).fold(0.0f32, f32::max);
        if peak <= EPSILON {
            break;
        }

        let cutoff = params.edge_fraction * peak;
        let edge: Vec<(f64, f64)> = band
            .iter()
            .filter(|p| p.2 >= cutoff)
            .map(|p| (p.0, p.1))
            .collect();
        let Some((cx, cy, radius)) = fit_circle(&edge) else {
            break;
        };
        if radius < 0.5 * disc.radius || radius > 2.0 * disc.radius {
            break;
        }
        fit = LimbFit {
            cx,
            cy,
            radius,
            points: edge.len(),
        };
    }
    fit
}

/// Algebraic (Kåsa) least-squares circle fit: `x² + y² + Dx + Ey + F = 0`.
pub fn fit_circle(points: &[(f64, f64)]) -> Option<(f64, f64, f64)> {
    if points.len() < 3 {
        return None;
    }
    let mut m = [[0.0f64; 3]; 3];
    let mut rhs = [0.0f64; 3];
    for &(x, y) in points {
        let row = [x, y, 1.0];
        let z = -(x * x + y * y);
        for i in 0..3 {
            for j in 0..3 {
                m[i][j] += row[i] * row[j];
            }
            rhs[i] += row[i] * z;
        }
    }
    let [d, e, f] = solve3(&m, &rhs)?;
    let (cx, cy) = (-d / 2.0, -e / 2.0);
    let r2 = cx * cx + cy * cy - f;
    (r2 > 0.0 && r2.is_finite()).then(|| (cx, cy, r2.sqrt()))
}

/// Sobel gradient magnitude; border pixels are zero.
fn sobel_magnitude(map: &Array2<f32>) -> Array2<f32> {
    let (h, w) = map.dim();
    let mut out = Array2::<f32>::zeros((h, w));
    if h < 3 || w < 3 {
        return out;
    }
    for row in 1..h - 1 {
        for col in 1..w - 1 {
            let p = |dr: usize, dc: usize| map[[row + dr - 1, col + dc - 1]];
            let gx = (p(0, 2) + 2.0 * p(1, 2) + p(2, 2)) - (p(0, 0) + 2.0 * p(1, 0) + p(2, 0));
            let gy = (p(2, 0) + 2.0 * p(2, 1) + p(2, 2)) - (p(0, 0) + 2.0 * p(0, 1) + p(0, 2));
            out[[row, col]] = gx.hypot(gy);
        }
    }
    out
}

/// Mean brightness per angular bin over an annulus of the disc, with the
/// overall mean removed.
fn angular_profile(map: &Array2<f32>, limb: &LimbFit) -> Vec<f64> {
    let bins = ROTATION_PROFILE_BINS;
    let mut sums = vec![0.0f64; bins];
    let mut counts = vec![0usize; bins];
    let (inner, outer) = (limb.radius * PROFILE_BAND.0, limb.radius * PROFILE_BAND.1);

    for ((row, col), &v) in map.indexed_iter() {
        let (dx, dy) = (col as f64 - limb.cx, row as f64 - limb.cy);
        let r = dx.hypot(dy);
        if r < inner || r > outer {
            continue;
        }
        let turn = (dy.atan2(dx) + std::f64::consts::PI) / TAU;
        let bin = ((turn * bins as f64) as usize) % bins;
        sums[bin] += v as f64;
        counts[bin] += 1;
    }

    let filled: Vec<Option<f64>> = sums
        .iter()
        .zip(&counts)
        .map(|(&s, &n)| (n > 0).then(|| s / n as f64))
        .collect();
    let present: Vec<f64> = filled.iter().flatten().copied().collect();
    if present.is_empty() {
        return vec![0.0; bins];
    }
    let mean = present.iter().sum::<f64>() / present.len() as f64;
    filled.into_iter().map(|v| v.map_or(0.0, |v| v - mean)).collect()
}

/// Angle (radians) by which the target profile is rotated relative to the
/// reference, from circular cross-correlation.
fn profile_rotation(reference: &[f64], target: &[f64]) -> f64 {
    let n = reference.len();
    if n == 0 || target.len() != n {
        return 0.0;
    }
    let score = |shift: usize| -> f64 {
        (0..n)
            .map(|i| reference[i] * target[(i + shift) % n])
            .sum()
    };
    let scores: Vec<f64> = (0..n).map(score).collect();
    let Some((best, &peak)) = scores
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
    else {
        return 0.0;
    };
    if peak <= 0.0 {
        return 0.0;
    }

    let prev = scores[(best + n - 1) % n];
    let next = scores[(best + 1) % n];
    let curvature = prev - 2.0 * peak + next;
    let sub = if curvature.abs() > 1e-12 {
        ((prev - next) / (2.0 * curvature)).clamp(-0.5, 0.5)
    } else {
        0.0
    };

    let mut shift = best as f64 + sub;
    if shift > n as f64 / 2.0 {
        shift -= n as f64;
    }
    shift * TAU / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_fit_recovers_centre_and_radius() {
        let points: Vec<(f64, f64)> = (0..36)
            .map(|i| {
                let t = i as f64 * TAU / 36.0;
                (20.0 + 7.0 * t.cos(), 12.5 + 7.0 * t.sin())
            })
            .collect();
        let (cx, cy, r) = fit_circle(&points).unwrap();
        assert!((cx - 20.0).abs() < 1e-6);
        assert!((cy - 12.5).abs() < 1e-6);
        assert!((r - 7.0).abs() < 1e-6);
    }

    #[test]
    fn quality_raises_effort() {
        let low = LimbParams::from_quality(0);
        let high = LimbParams::from_quality(100);
        assert!(high.smoothing > low.smoothing);
        assert!(high.edge_fraction < low.edge_fraction);
        assert!(high.iterations > low.iterations);
    }

    #[test]
    fn profile_rotation_finds_bin_shift() {
        let n = ROTATION_PROFILE_BINS;
        let reference: Vec<f64> = (0..n)
            .map(|i| (i as f64 * TAU / n as f64).cos() + (3.0 * i as f64 * TAU / n as f64).sin())
            .collect();
        let target: Vec<f64> = (0..n).map(|i| reference[(i + n - 10) % n]).collect();
        let angle = profile_rotation(&reference, &target);
        assert!((angle.to_degrees() - 10.0).abs() < 0.5);
    }
}
