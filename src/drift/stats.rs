//! Small statistical helpers for trend analysis.
//!
//! All functions operate on plain `f64` slices and return 0 or `None` for
//! degenerate inputs rather than erroring; the callers decide how to
//! annotate short windows.

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Median by sorting a copy; `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Sample standard deviation (n - 1 denominator); 0 below two samples.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64;
    variance.sqrt()
}

/// Standard error of the mean; 0 below two samples.
pub fn standard_error(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    sample_std(values) / (values.len() as f64).sqrt()
}

/// Least-squares slope of `values` against their index; `None` below two
/// samples.
pub fn regression_slope(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let n_f = n as f64;
    let x_mean = (n_f - 1.0) / 2.0;
    let y_mean = values.iter().sum::<f64>() / n_f;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_median() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert!((mean(&values).unwrap() - 2.5).abs() < 1e-12);
        assert!((median(&values).unwrap() - 2.5).abs() < 1e-12);
        assert!((median(&[3.0, 1.0, 2.0]).unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_slices() {
        assert!(mean(&[]).is_none());
        assert!(median(&[]).is_none());
        assert_eq!(sample_std(&[]), 0.0);
        assert_eq!(standard_error(&[1.0]), 0.0);
        assert!(regression_slope(&[1.0]).is_none());
    }

    #[test]
    fn test_sample_std() {
        // Known value: std of [2, 4, 4, 4, 5, 5, 7, 9] with n-1 is ~2.138.
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((sample_std(&values) - 2.138089935).abs() < 1e-6);
    }

    #[test]
    fn test_slope_of_linear_series() {
        let values: Vec<f64> = (0..10).map(|i| 1.0 - 0.02 * f64::from(i)).collect();
        let slope = regression_slope(&values).unwrap();
        assert!((slope - (-0.02)).abs() < 1e-12);
    }

    #[test]
    fn test_slope_of_constant_series() {
        let values = [0.9; 8];
        let slope = regression_slope(&values).unwrap();
        assert!(slope.abs() < 1e-12);
    }

    #[test]
    fn test_slope_positive_trend() {
        let values = [0.5, 0.6, 0.7, 0.8];
        assert!(regression_slope(&values).unwrap() > 0.0);
    }
}
