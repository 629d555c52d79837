//! Metric query clients
//!
//! Thin, stateless wrappers over the backend trait. Retry policy belongs to
//! the callers; the fetchers report exactly what the backend returned.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::try_join_all;
use tracing::debug;

use crate::backend::{MetricDataQuery, MetricIdentity, MetricListQuery, MetricsBackend};
use crate::common::Result;
use crate::dimension::Dimension;
use crate::metric::{Statistic, LOOKBACK_WINDOW};

/// Fetches datapoint sequences for a single metric
#[derive(Clone)]
pub struct MetricValueFetcher {
    backend: Arc<dyn MetricsBackend>,
}

impl MetricValueFetcher {
    pub fn new(backend: Arc<dyn MetricsBackend>) -> Self {
        Self { backend }
    }

    /// Fetch the chronological datapoints over the fixed lookback window.
    /// An empty result is normal while ingestion catches up.
    pub async fn fetch(
        &self,
        namespace: &str,
        metric_name: &str,
        dimensions: &[Dimension],
        statistic: Statistic,
        period_seconds: u32,
    ) -> Result<Vec<f64>> {
        let query = MetricDataQuery::over_lookback(
            namespace,
            metric_name,
            dimensions,
            statistic,
            period_seconds,
            LOOKBACK_WINDOW,
        );
        debug!(namespace, metric_name, %statistic, period_seconds, "fetching metric values");
        let values = self.backend.get_metric_data(&query).await?;
        debug!(metric_name, count = values.len(), "fetched metric values");
        Ok(values)
    }

    /// Fetch several statistics for the same metric/dimension set
    /// concurrently. All queries must complete (or error) before returning;
    /// the first error wins.
    pub async fn fetch_extended(
        &self,
        namespace: &str,
        metric_name: &str,
        dimensions: &[Dimension],
        statistics: &[Statistic],
        period_seconds: u32,
    ) -> Result<HashMap<Statistic, Vec<f64>>> {
        let fetches = statistics.iter().map(|&stat| {
            let fetcher = self.clone();
            async move {
                let values = fetcher
                    .fetch(namespace, metric_name, dimensions, stat, period_seconds)
                    .await?;
                Ok::<_, crate::common::Error>((stat, values))
            }
        });

        let results = try_join_all(fetches).await?;
        Ok(results.into_iter().collect())
    }
}

/// Lists metric series matching a namespace/dimension filter
#[derive(Clone)]
pub struct MetricListFetcher {
    backend: Arc<dyn MetricsBackend>,
}

impl MetricListFetcher {
    pub fn new(backend: Arc<dyn MetricsBackend>) -> Self {
        Self { backend }
    }

    pub async fn fetch(
        &self,
        namespace: &str,
        metric_name: &str,
        dimensions: &[Dimension],
    ) -> Result<Vec<MetricIdentity>> {
        let query = MetricListQuery {
            namespace: namespace.to_string(),
            metric_name: metric_name.to_string(),
            dimensions: dimensions.to_vec(),
        };
        debug!(namespace, metric_name, "listing metrics");
        self.backend.list_metrics(&query).await
    }
}
