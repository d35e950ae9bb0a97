use ndarray::Array2;

use crate::consts::OTSU_HISTOGRAM_BINS;

use super::config::ThresholdMethod;

/// Resolve the configured method to a brightness threshold for `map`.
pub fn compute_threshold(map: &Array2<f32>, method: &ThresholdMethod, sigma_mul: f32) -> f32 {
    match method {
        ThresholdMethod::MeanPlusSigma => {
            let (mean, std) = mean_stddev(map);
            (mean + sigma_mul as f64 * std) as f32
        }
        ThresholdMethod::Otsu => otsu_threshold(map),
        ThresholdMethod::Fixed(v) => *v,
    }
}

/// Population mean and standard deviation of all samples.
pub fn mean_stddev(map: &Array2<f32>) -> (f64, f64) {
    if map.is_empty() {
        return (0.0, 0.0);
    }
    let n = map.len() as f64;
    let mean = map.iter().map(|&v| v as f64).sum::<f64>() / n;
    let var = map
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    (mean, var.sqrt())
}

/// Otsu's threshold over a histogram of values clamped to [0, 1].
///
/// Returns the centre of the bin that best splits the histogram into two
/// classes.
pub fn otsu_threshold(map: &Array2<f32>) -> f32 {
    let bins = OTSU_HISTOGRAM_BINS;
    let mut histogram = vec![0u64; bins];
    for &v in map.iter() {
        let bin = ((v.clamp(0.0, 1.0) * (bins - 1) as f32).round() as usize).min(bins - 1);
        histogram[bin] += 1;
    }

    let total = map.len() as f64;
    let weighted_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut below = 0.0f64;
    let mut weighted_below = 0.0f64;
    let mut best = (0usize, 0.0f64);

    for (i, &count) in histogram.iter().enumerate() {
        below += count as f64;
        weighted_below += i as f64 * count as f64;
        let above = total - below;
        if below == 0.0 {
            continue;
        }
        if above == 0.0 {
            break;
        }
        let mean_below = weighted_below / below;
        let mean_above = (weighted_total - weighted_below) / above;
        let between = below * above * (mean_below - mean_above).powi(2);
        if between > best.1 {
            best = (i, between);
        }
    }

    (best.0 as f32 + 0.5) / (bins - 1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otsu_splits_bimodal_map() {
        let map = Array2::from_shape_fn((10, 10), |(r, _)| if r < 5 { 0.1 } else { 0.9 });
        let t = otsu_threshold(&map);
        assert!(t > 0.1 && t < 0.9, "threshold {t}");
    }
}
