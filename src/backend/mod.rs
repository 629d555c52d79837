//! Opaque metrics backend boundary
//!
//! The harness only needs two operations from the time-series service:
//! "fetch ordered datapoints for a metric/dimension/statistic/window" and
//! "list metrics matching a namespace/dimension filter". The trait keeps the
//! validators independent of the wire format; the HTTP implementation talks
//! to the query endpoint configured in `config.toml`.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::common::{Error, Result};
use crate::dimension::Dimension;
use crate::metric::Statistic;

/// One time-windowed statistic query
#[derive(Debug, Clone, Serialize)]
pub struct MetricDataQuery {
    #[serde(rename = "Namespace")]
    pub namespace: String,
    #[serde(rename = "MetricName")]
    pub metric_name: String,
    #[serde(rename = "Dimensions")]
    pub dimensions: Vec<Dimension>,
    #[serde(rename = "Statistic")]
    pub statistic: Statistic,
    #[serde(rename = "PeriodSeconds")]
    pub period_seconds: u32,
    #[serde(rename = "StartTime")]
    pub start_time: u64,
    #[serde(rename = "EndTime")]
    pub end_time: u64,
}

impl MetricDataQuery {
    /// Build a query over the fixed lookback window ending now
    pub fn over_lookback(
        namespace: &str,
        metric_name: &str,
        dimensions: &[Dimension],
        statistic: Statistic,
        period_seconds: u32,
        lookback: Duration,
    ) -> Self {
        let end = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let start = end.saturating_sub(lookback.as_secs());
        Self {
            namespace: namespace.to_string(),
            metric_name: metric_name.to_string(),
            dimensions: dimensions.to_vec(),
            statistic,
            period_seconds,
            start_time: start,
            end_time: end,
        }
    }
}

/// Namespace/dimension filter for metric discovery
#[derive(Debug, Clone, Serialize)]
pub struct MetricListQuery {
    #[serde(rename = "Namespace")]
    pub namespace: String,
    #[serde(rename = "MetricName")]
    pub metric_name: String,
    #[serde(rename = "Dimensions")]
    pub dimensions: Vec<Dimension>,
}

/// Identity of one metric series known to the backend
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MetricIdentity {
    #[serde(rename = "Namespace")]
    pub namespace: String,
    #[serde(rename = "MetricName")]
    pub metric_name: String,
    #[serde(rename = "Dimensions", default)]
    pub dimensions: Vec<Dimension>,
}

/// Time-series query service
#[async_trait]
pub trait MetricsBackend: Send + Sync {
    /// Ordered (chronological) datapoints for the query window. A successful
    /// query with no datapoints returns an empty vec, not an error: "metric
    /// not visible yet" is an expected transient during ingestion.
    async fn get_metric_data(&self, query: &MetricDataQuery) -> Result<Vec<f64>>;

    /// Metric series matching a namespace/dimension filter
    async fn list_metrics(&self, query: &MetricListQuery) -> Result<Vec<MetricIdentity>>;
}

#[derive(Debug, Deserialize)]
struct GetMetricDataResponse {
    #[serde(rename = "Values", default)]
    values: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct ListMetricsResponse {
    #[serde(rename = "Metrics", default)]
    metrics: Vec<MetricIdentity>,
}

/// HTTP implementation against the configured query endpoint
pub struct HttpMetricsBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpMetricsBackend {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl MetricsBackend for HttpMetricsBackend {
    async fn get_metric_data(&self, query: &MetricDataQuery) -> Result<Vec<f64>> {
        let response = self
            .client
            .post(self.url("metrics/data"))
            .json(query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::BackendQuery(format!(
                "get_metric_data for {}/{} returned {}",
                query.namespace,
                query.metric_name,
                response.status()
            )));
        }

        let body: GetMetricDataResponse = response
            .json()
            .await
            .map_err(|e| Error::BackendResponse(e.to_string()))?;
        Ok(body.values)
    }

    async fn list_metrics(&self, query: &MetricListQuery) -> Result<Vec<MetricIdentity>> {
        let response = self
            .client
            .post(self.url("metrics/list"))
            .json(query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::BackendQuery(format!(
                "list_metrics for {} returned {}",
                query.namespace,
                response.status()
            )));
        }

        let body: ListMetricsResponse = response
            .json()
            .await
            .map_err(|e| Error::BackendResponse(e.to_string()))?;
        Ok(body.metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookback_window_ends_now() {
        let query = MetricDataQuery::over_lookback(
            "TelemetryAgent",
            "cpu_usage_idle",
            &[],
            Statistic::Average,
            60,
            Duration::from_secs(600),
        );
        assert_eq!(query.end_time - query.start_time, 600);
    }

    #[test]
    fn query_serializes_with_backend_field_names() {
        let query = MetricDataQuery::over_lookback(
            "ns",
            "m",
            &[Dimension {
                name: "InstanceId".to_string(),
                value: "i-123".to_string(),
            }],
            Statistic::SampleCount,
            10,
            Duration::from_secs(600),
        );
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["Namespace"], "ns");
        assert_eq!(json["Statistic"], "SampleCount");
        assert_eq!(json["Dimensions"][0]["Name"], "InstanceId");
    }
}
