//! Metric statistics, fetchers, and value validators

pub mod bounds;
pub mod fetcher;
pub mod presence;

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Statistic kinds the harness queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Statistic {
    Average,
    Sum,
    SampleCount,
    Minimum,
    Maximum,
    #[serde(rename = "p50")]
    P50,
    #[serde(rename = "p90")]
    P90,
    #[serde(rename = "p95")]
    P95,
    #[serde(rename = "p99")]
    P99,
}

impl Statistic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Statistic::Average => "Average",
            Statistic::Sum => "Sum",
            Statistic::SampleCount => "SampleCount",
            Statistic::Minimum => "Minimum",
            Statistic::Maximum => "Maximum",
            Statistic::P50 => "p50",
            Statistic::P90 => "p90",
            Statistic::P95 => "p95",
            Statistic::P99 => "p99",
        }
    }

    /// The percentile set used by extended fetches
    pub const PERCENTILES: [Statistic; 4] =
        [Statistic::P50, Statistic::P90, Statistic::P95, Statistic::P99];
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Period for high-resolution (sub-minute) pipelines, seconds
pub const HIGH_RESOLUTION_PERIOD_SECONDS: u32 = 10;

/// Period for standard-resolution pipelines, seconds
pub const MINUTE_PERIOD_SECONDS: u32 = 60;

/// Fixed query window: the harness never validates pre-test data
pub const LOOKBACK_WINDOW: Duration = Duration::from_secs(10 * 60);
