//! Sliding-Window Dataset Preparation
//!
//! ## Overview
//!
//! Turns an ordered time series into fixed-length (window, target) training
//! pairs by sliding a window of `n_steps` samples across the series one step
//! at a time. Each window is paired with the sample immediately following
//! it, which is what the regression model learns to predict.
//!
//! ```text
//! series:  s0 s1 s2 s3 s4          n_steps = 3
//!
//! pair 0:  [s0 s1 s2] -> s3
//! pair 1:  [s1 s2 s3] -> s4
//! ```
//!
//! ## Edge Cases
//!
//! A series of `n_steps` or fewer samples yields zero pairs - this is not
//! an error here, but an empty window set is fatal at training time because
//! the process cannot proceed to the serving loop without a fitted model.

use crate::sample::Sample;

/// Produce (window, target) pairs by sliding a stride-1 window over `series`
///
/// Windows borrow from `series`; the target is the sample immediately after
/// the window. For a series of N samples and window length L this yields
/// exactly `N - L` pairs when `N > L`, and none otherwise.
pub fn split_sequences(series: &[Sample], n_steps: usize) -> Vec<(&[Sample], Sample)> {
    if n_steps == 0 || series.len() <= n_steps {
        return Vec::new();
    }

    (0..series.len() - n_steps)
        .map(|i| (&series[i..i + n_steps], series[i + n_steps]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn series(n: usize) -> Vec<Sample> {
        (0..n)
            .map(|i| Sample::new(40.0 + i as f32, 20.0 + i as f32))
            .collect()
    }

    #[test]
    fn short_series_yields_nothing() {
        for n in 0..=3 {
            assert!(split_sequences(&series(n), 3).is_empty());
        }
    }

    #[test]
    fn windows_and_targets_line_up() {
        let data = series(6);
        let pairs = split_sequences(&data, 3);

        assert_eq!(pairs.len(), 3);
        for (i, (window, target)) in pairs.iter().enumerate() {
            assert_eq!(*window, &data[i..i + 3]);
            assert_eq!(*target, data[i + 3]);
        }
    }

    #[test]
    fn zero_steps_yields_nothing() {
        assert!(split_sequences(&series(10), 0).is_empty());
    }

    proptest! {
        #[test]
        fn pair_count_matches_series_length(n in 0usize..200, l in 1usize..8) {
            let data = series(n);
            let pairs = split_sequences(&data, l);

            let expected = if n > l { n - l } else { 0 };
            prop_assert_eq!(pairs.len(), expected);

            for (window, _) in &pairs {
                prop_assert_eq!(window.len(), l);
            }
        }

        #[test]
        fn target_follows_its_window(n in 4usize..100) {
            let data = series(n);
            for (window, target) in split_sequences(&data, 3) {
                // The target is one step after the window's newest sample
                prop_assert_eq!(target.humidity, window[2].humidity + 1.0);
            }
        }
    }
}
