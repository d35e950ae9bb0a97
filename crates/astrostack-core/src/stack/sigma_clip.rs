use serde::{Deserialize, Serialize};

/// Parameters for sigma-clipped averaging.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SigmaClipParams {
    /// Values beyond mean +/- sigma * stddev are rejected (default: 2.5).
    #[serde(default = "default_sigma")]
    pub sigma: f32,
    /// Number of rejection passes (default: 2).
    #[serde(default = "default_iterations")]
    pub iterations: usize,
}

fn default_sigma() -> f32 {
    2.5
}
fn default_iterations() -> usize {
    2
}

impl Default for SigmaClipParams {
    fn default() -> Self {
        Self {
            sigma: default_sigma(),
            iterations: default_iterations(),
        }
    }
}

/// Mean of `values` after iteratively rejecting outliers.
///
/// `keep` is scratch space of the same length. If a pass would reject every
/// value the previous survivors are kept. Empty input yields 0.
pub fn clipped_mean(values: &[f32], keep: &mut [bool], params: &SigmaClipParams) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    keep.iter_mut().for_each(|k| *k = true);

    for _ in 0..params.iterations {
        let (mean, stddev) = masked_mean_stddev(values, keep);
        if stddev < 1e-10 {
            break;
        }
        let (lo, hi) = (mean - params.sigma * stddev, mean + params.sigma * stddev);
        let survivors = values
            .iter()
            .zip(keep.iter())
            .filter(|(v, k)| **k && **v >= lo && **v <= hi)
            .count();
        if survivors == 0 {
            break;
        }
        for (v, k) in values.iter().zip(keep.iter_mut()) {
            if *k && (*v < lo || *v > hi) {
                *k = false;
            }
        }
    }

    masked_mean_stddev(values, keep).0
}

fn masked_mean_stddev(values: &[f32], keep: &[bool]) -> (f32, f32) {
    let kept = || values.iter().zip(keep).filter(|(_, k)| **k).map(|(v, _)| *v);
    let count = kept().count();
    if count == 0 {
        return (0.0, 0.0);
    }
    let mean = kept().sum::<f32>() / count as f32;
    let var = kept().map(|v| (v - mean) * (v - mean)).sum::<f32>() / count as f32;
    (mean, var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outlier_is_rejected() {
        let mut values = vec![0.5f32; 9];
        values.push(1.0);
        let mut keep = vec![true; values.len()];
        let params = SigmaClipParams {
            sigma: 2.0,
            iterations: 2,
        };
        let mean = clipped_mean(&values, &mut keep, &params);
        assert!((mean - 0.5).abs() < 1e-6);
    }
}
