//! Dimension presence/absence checks
//!
//! Asserts that a metric does or does not exist under a given dimension set.
//! Used to test configuration-dependent aggregation: under a global
//! append_dimensions config the agent must drop the original "host"
//! dimension, so the same metric resolves under the appended dimensions and
//! yields nothing under the host dimension.

use tracing::info;

use crate::common::{Error, Result};
use crate::dimension::{DimensionFactory, Instruction};
use crate::metric::bounds::{all_greater_or_equal, DEFAULT_TOLERANCE};
use crate::metric::fetcher::MetricValueFetcher;
use crate::metric::{Statistic, HIGH_RESOLUTION_PERIOD_SECONDS};
use crate::status::TestResult;

/// Resolve instructions and fetch; unresolved instructions are a hard
/// failure, never a partial match.
async fn fetch_guarded(
    fetcher: &MetricValueFetcher,
    factory: &DimensionFactory,
    namespace: &str,
    metric_name: &str,
    instructions: &[Instruction],
) -> Result<Vec<f64>> {
    let (dims, unresolved) = factory.resolve(instructions);
    if !unresolved.is_empty() {
        let keys: Vec<&str> = unresolved.iter().map(|i| i.key.as_str()).collect();
        return Err(Error::UnresolvedDimensions(keys.join(", ")));
    }

    fetcher
        .fetch(
            namespace,
            metric_name,
            &dims,
            Statistic::Average,
            HIGH_RESOLUTION_PERIOD_SECONDS,
        )
        .await
}

/// The metric must exist under the given dimensions with all values >= 0
pub async fn dimensions_present(
    fetcher: &MetricValueFetcher,
    factory: &DimensionFactory,
    namespace: &str,
    metric_name: &str,
    instructions: &[Instruction],
) -> TestResult {
    match fetch_guarded(fetcher, factory, namespace, metric_name, instructions).await {
        Ok(values) => {
            if all_greater_or_equal(metric_name, &values, 0.0, DEFAULT_TOLERANCE) {
                TestResult::successful(metric_name)
            } else {
                TestResult::failed(
                    metric_name,
                    "expected metric with specified dimensions but found no valid values",
                )
            }
        }
        Err(e) => TestResult::failed(metric_name, e),
    }
}

/// The metric must NOT exist under the given dimensions (they were dropped)
pub async fn dimensions_absent(
    fetcher: &MetricValueFetcher,
    factory: &DimensionFactory,
    namespace: &str,
    metric_name: &str,
    instructions: &[Instruction],
) -> TestResult {
    let name = format!("{metric_name} (dropped dimensions)");
    match fetch_guarded(fetcher, factory, namespace, metric_name, instructions).await {
        Ok(values) => {
            if values.is_empty() {
                TestResult::successful(name)
            } else {
                TestResult::failed(
                    name,
                    format!("expected dimensions to be absent but found {} values", values.len()),
                )
            }
        }
        Err(e) => TestResult::failed(name, e),
    }
}

/// Combined check for global append_dimensions configs: the appended
/// dimensions are present and the original "host" set is dropped.
pub async fn global_append_dimensions(
    fetcher: &MetricValueFetcher,
    factory: &DimensionFactory,
    namespace: &str,
    metric_name: &str,
    present: &[Instruction],
    dropped: &[Instruction],
) -> TestResult {
    let result = dimensions_present(fetcher, factory, namespace, metric_name, present).await;
    if result.status != crate::status::TestStatus::Successful {
        return result;
    }

    let absent = dimensions_absent(fetcher, factory, namespace, metric_name, dropped).await;
    if absent.status != crate::status::TestStatus::Successful {
        return absent;
    }

    info!(namespace, metric_name, "verified dimensions present and original dimensions dropped");
    result
}
