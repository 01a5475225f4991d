//! Small descriptive-statistics helpers shared by the rolling engine and the
//! feature scaler.

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Computes the population standard deviation (ddof = 0) given a pre-computed mean.
/// Returns 0.0 for empty input.
pub fn stddev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;

    variance.sqrt()
}

/// Mean and population standard deviation in one pass over `values`.
///
/// A constant slice yields exactly its value and a standard deviation of
/// exactly 0.0, so floating-point residue in the summation can never turn a
/// flat series into a non-zero spread.
pub fn moments(values: &[f64]) -> (f64, f64) {
    match values.first() {
        None => (0.0, 0.0),
        Some(&first) if values.iter().all(|v| *v == first) => (first, 0.0),
        Some(_) => {
            let m = mean(values);
            (m, stddev(values, m))
        }
    }
}
