/// Median of `values`, reordering them in place.
///
/// Uses `select_nth_unstable` for O(n) selection without a full sort. An
/// even count yields the mean of the two middle values. Empty input yields 0.
pub fn median_in_place(values: &mut [f32]) -> f32 {
    let n = values.len();
    match n {
        0 => 0.0,
        1 => values[0],
        _ if n % 2 == 1 => *values.select_nth_unstable_by(n / 2, |a, b| a.total_cmp(b)).1,
        _ => {
            let mid = n / 2;
            let (lower, upper, _) = values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
            let upper = *upper;
            // Everything left of `mid` is <= the upper middle; its max is the
            // lower middle.
            let lower = lower.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            (lower + upper) / 2.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_count_takes_middle() {
        assert_eq!(median_in_place(&mut [0.9, 0.1, 0.5]), 0.5);
    }

    #[test]
    fn even_count_averages_middle_pair() {
        assert!((median_in_place(&mut [0.4, 0.1, 0.8, 0.2]) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(median_in_place(&mut []), 0.0);
    }
}
