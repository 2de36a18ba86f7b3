//! Sequence kernels over one site's chronologically ordered values.
//!
//! Every function here assumes its input is a single site's series sorted by
//! time; grouping and ordering are the caller's job.

/// Value `lag` rows earlier, `None` for the first `lag` rows.
pub fn lag(values: &[Option<f64>], lag: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| if i >= lag { values[i - lag] } else { None })
        .collect()
}

/// Trailing mean over up to `window` rows ending at each row (inclusive).
/// Missing values are skipped; at least one present value is required.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, 1, |present| {
        present.iter().sum::<f64>() / present.len() as f64
    })
}

/// Trailing sample standard deviation (n - 1 denominator) over up to `window`
/// rows ending at each row. At least two present values are required.
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, 2, |present| {
        let n = present.len() as f64;
        let mean = present.iter().sum::<f64>() / n;
        let var = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        var.sqrt()
    })
}

fn rolling<F>(values: &[Option<f64>], window: usize, min_periods: usize, stat: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    let mut present = Vec::with_capacity(window);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            present.clear();
            present.extend(values[start..=i].iter().flatten().copied());
            if present.len() >= min_periods.max(1) {
                Some(stat(&present))
            } else {
                None
            }
        })
        .collect()
}

/// Rolling mean of strictly earlier rows: the window ending one row before.
pub fn trailing_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    lag(&rolling_mean(values, window), 1)
}

/// Rolling standard deviation of strictly earlier rows.
pub fn trailing_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    lag(&rolling_std(values, window), 1)
}
