//! Pure value validators
//!
//! Stateless decisions over a fetched datapoint sequence. An empty sequence
//! always fails: "no data" is never conflated with "no violations found".

use tracing::info;

/// Default tolerance band around an expected mean (fraction)
pub const DEFAULT_TOLERANCE: f64 = 0.10;

/// Looser band for the statsd pipeline, which aggregates more coarsely
pub const STATSD_TOLERANCE: f64 = 0.20;

/// Inclusive range applied to the mean of the fetched values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    /// Bounds derived from an expected value and a tolerance fraction
    pub fn around(expected: f64, tolerance: f64) -> Self {
        Self {
            lower: expected * (1.0 - tolerance),
            upper: expected * (1.0 + tolerance),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// All values must be >= 0 and, when `floor > 0`, the mean must lie within
/// `floor * (1 ± tolerance)`.
pub fn all_greater_or_equal(metric_name: &str, values: &[f64], floor: f64, tolerance: f64) -> bool {
    if values.is_empty() {
        info!(metric_name, "no values found");
        return false;
    }

    if values.iter().any(|&v| v < 0.0) {
        info!(metric_name, "values are not all greater than or equal to zero");
        return false;
    }

    if floor > 0.0 {
        let average = mean(values);
        let bounds = Bounds::around(floor, tolerance);
        if average < bounds.lower || average > bounds.upper {
            info!(
                metric_name,
                average,
                lower = bounds.lower,
                upper = bounds.upper,
                "average is not within bounds"
            );
            return false;
        }
        info!(
            metric_name,
            average,
            lower = bounds.lower,
            upper = bounds.upper,
            "average is within bounds"
        );
    }

    true
}

/// Mean of the values must lie within the inclusive bounds
pub fn within_bounds(values: &[f64], bounds: &Bounds) -> bool {
    if values.is_empty() {
        return false;
    }
    let average = mean(values);
    average >= bounds.lower && average <= bounds.upper
}

/// Whether the observed datapoint count matches the expected count derived
/// from `run_duration / aggregation_interval`, within ±slack points. The
/// slack absorbs non-deterministic end-to-end ingestion latency.
pub fn sample_count_in_range(
    actual: usize,
    run_duration: std::time::Duration,
    aggregation_interval: std::time::Duration,
    slack: usize,
) -> bool {
    if aggregation_interval.is_zero() {
        return false;
    }
    let expected = (run_duration.as_secs() / aggregation_interval.as_secs()) as usize;
    let lower = expected.saturating_sub(slack);
    let upper = expected + slack;
    actual >= lower && actual <= upper
}
