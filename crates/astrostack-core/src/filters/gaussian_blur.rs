use ndarray::Array2;
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;

/// Gaussian blur of a single-plane map using separable 1D convolution.
///
/// Edges are handled by clamping to the nearest valid pixel. A non-positive
/// sigma returns the input unchanged.
pub fn gaussian_blur_map(data: &Array2<f32>, sigma: f32) -> Array2<f32> {
    if sigma <= 0.0 || data.is_empty() {
        return data.clone();
    }
    let kernel = gaussian_kernel(sigma);
    let horizontal = convolve(data, &kernel, true);
    convolve(&horizontal, &kernel, false)
}

fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (sigma * 3.0).ceil() as isize;
    let s2 = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|x| (-(x * x) as f32 / s2).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);
    kernel
}

fn convolve(data: &Array2<f32>, kernel: &[f32], horizontal: bool) -> Array2<f32> {
    let (h, w) = data.dim();
    let radius = (kernel.len() / 2) as isize;

    let at = |row: usize, col: usize| -> f32 {
        kernel
            .iter()
            .enumerate()
            .map(|(k, &kv)| {
                let shift = k as isize - radius;
                let (r, c) = if horizontal {
                    (row, (col as isize + shift).clamp(0, w as isize - 1) as usize)
                } else {
                    ((row as isize + shift).clamp(0, h as isize - 1) as usize, col)
                };
                data[[r, c]] * kv
            })
            .sum()
    };

    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        let values: Vec<f32> = (0..h)
            .into_par_iter()
            .flat_map_iter(|row| (0..w).map(move |col| at(row, col)))
            .collect();
        Array2::from_shape_vec((h, w), values).unwrap_or_else(|_| data.clone())
    } else {
        Array2::from_shape_fn((h, w), |(row, col)| at(row, col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blur_preserves_constant_map() {
        let map = Array2::from_elem((16, 16), 0.4f32);
        let blurred = gaussian_blur_map(&map, 1.5);
        assert!(blurred.iter().all(|v| (v - 0.4).abs() < 1e-5));
    }

    #[test]
    fn blur_spreads_a_point() {
        let mut map = Array2::<f32>::zeros((9, 9));
        map[[4, 4]] = 1.0;
        let blurred = gaussian_blur_map(&map, 1.0);
        assert!(blurred[[4, 4]] < 1.0);
        assert!(blurred[[4, 5]] > 0.0);
        assert!((blurred.sum() - 1.0).abs() < 1e-4);
    }
}
