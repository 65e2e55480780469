//! Trailing rolling average and first difference.

use leaven_common::error::{LeavenError, LeavenResult};

/// Trailing rolling mean of `values` over `window` samples.
///
/// The window is clamped at the start of the series: element `i` is the mean
/// of `values[i + 1 - min(i + 1, window)..=i]`, so the output always has the
/// same length as the input and no element is undefined.
///
/// Every window is summed afresh, so identical samples always produce
/// identical means.
pub fn rolling_average(values: &[f64], window: usize) -> LeavenResult<Vec<f64>> {
    if window == 0 {
        return Err(LeavenError::processing(
            "Rolling average window must be a positive integer",
        ));
    }

    let result = (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect();

    Ok(result)
}

/// Successive deltas `values[i + 1] - values[i]`; one shorter than the input.
pub fn first_difference(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|pair| pair[1] - pair[0]).collect()
}
