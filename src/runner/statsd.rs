//! Statsd pipeline validation
//!
//! Drives known values through the agent's statsd listener and checks they
//! come back out: the per-metric average must sit inside the statsd
//! tolerance band around the emitted value, and the datapoint count must
//! match what the aggregation interval predicts for the run duration.
//!
//! The emitter starts right after the agent does and is stopped before the
//! first backend read, so validation never races a still-growing series.
//! Ingestion lag is absorbed by the bounded validation retry.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::common::{Error, RetryPolicy};
use crate::dimension::Instruction;
use crate::generator::statsd::{
    metric_type, start_emitter, EmitterHandle, STATSD_METRIC_NAMES, STATSD_METRIC_VALUES,
};
use crate::metric::bounds::{sample_count_in_range, within_bounds, Bounds};
use crate::metric::Statistic;
use crate::status::{TestGroupResult, TestResult};

use super::{HarnessContext, TestRunner};

/// Datapoint-count slack absorbing ingestion latency at the window edges
const SAMPLE_COUNT_SLACK: usize = 2;

/// The statsd pipeline needs several aggregation intervals of data before
/// the sample-count check means anything.
pub const STATSD_RUN_DURATION: Duration = Duration::from_secs(180);

pub struct StatsdTestRunner {
    namespace: String,
    config_path: Option<PathBuf>,
    target: String,
    send_interval: Duration,
    aggregation_interval: Duration,
    run_duration: Duration,
    emitter: Option<EmitterHandle>,
}

impl StatsdTestRunner {
    pub fn new(
        namespace: impl Into<String>,
        config_path: Option<PathBuf>,
        run_duration: Duration,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            config_path,
            target: "127.0.0.1:8125".to_string(),
            send_interval: Duration::from_secs(1),
            aggregation_interval: Duration::from_secs(30),
            run_duration,
            emitter: None,
        }
    }
}

#[async_trait]
impl TestRunner for StatsdTestRunner {
    fn test_name(&self) -> &str {
        "statsd"
    }

    fn agent_config_file(&self) -> Option<PathBuf> {
        self.config_path.clone()
    }

    fn run_duration(&self) -> Duration {
        self.run_duration
    }

    fn measured_metrics(&self) -> Vec<String> {
        STATSD_METRIC_NAMES.iter().map(|m| m.to_string()).collect()
    }

    async fn setup_after_run(&mut self, _ctx: &HarnessContext) -> Result<(), Error> {
        self.emitter = Some(start_emitter(self.target.clone(), self.send_interval));
        Ok(())
    }

    async fn validate(&mut self, ctx: &HarnessContext) -> TestGroupResult {
        let mut group = TestGroupResult::new(self.test_name());

        // The series must be final before any read.
        if let Some(emitter) = self.emitter.take() {
            if let Err(e) = emitter.stop().await {
                group
                    .test_results
                    .push(TestResult::failed("Stopping statsd emitter", e));
                return group;
            }
        }

        let policy = RetryPolicy::new(
            ctx.tuning.validate_retry_attempts,
            ctx.tuning.validate_retry_interval(),
        );
        let bounds_tolerance = ctx.tuning.statsd_tolerance;
        let period = self.aggregation_interval.as_secs() as u32;

        for (name, expected) in STATSD_METRIC_NAMES.iter().zip(STATSD_METRIC_VALUES) {
            let instructions = [
                Instruction::known("metric_type", metric_type(name)),
                Instruction::known("key", "value"),
            ];
            let (dims, unresolved) = ctx.factory.resolve(&instructions);
            if !unresolved.is_empty() {
                let keys: Vec<&str> = unresolved.iter().map(|i| i.key.as_str()).collect();
                group.test_results.push(TestResult::failed(
                    *name,
                    Error::UnresolvedDimensions(keys.join(", ")),
                ));
                continue;
            }

            let bounds = Bounds::around(expected, bounds_tolerance);
            let passes = |values: &[f64]| {
                within_bounds(values, &bounds)
                    && sample_count_in_range(
                        values.len(),
                        self.run_duration,
                        self.aggregation_interval,
                        SAMPLE_COUNT_SLACK,
                    )
            };

            let outcome = policy
                .run_until(
                    &ctx.cancel,
                    |attempt| {
                        debug!(metric = *name, attempt, "validating statsd metric");
                        let fetcher = ctx.fetcher.clone();
                        let namespace = self.namespace.clone();
                        let dims = dims.clone();
                        async move {
                            fetcher
                                .fetch(&namespace, name, &dims, Statistic::Average, period)
                                .await
                        }
                    },
                    |fetched| matches!(fetched, Ok(values) if passes(values)),
                )
                .await;

            let result = match outcome {
                Ok(Ok(values)) if passes(&values) => TestResult::successful(*name),
                Ok(Ok(values)) => TestResult::failed(
                    *name,
                    format!(
                        "{} datapoints with mean {:.2}, wanted [{:.2}, {:.2}]",
                        values.len(),
                        values.iter().sum::<f64>() / values.len().max(1) as f64,
                        bounds.lower,
                        bounds.upper
                    ),
                ),
                Ok(Err(e)) => TestResult::failed(*name, e),
                Err(e) => TestResult::failed(*name, e),
            };
            group.test_results.push(result);
        }

        group
    }
}
