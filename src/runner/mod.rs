//! Test runners and the suite orchestrator
//!
//! A `TestRunner` declares what one test needs (an agent config artifact,
//! how long the agent must run, what metrics it measures) and how to
//! validate the outcome. The compute-type strategy owns the agent lifecycle
//! around the run; the suite executes runners sequentially and folds their
//! group results.

pub mod append_dimensions;
pub mod cpu;
pub mod statsd;
pub mod strategy;
pub mod suite;

pub use strategy::{for_compute_type, RunOutcome, RunStrategy};
pub use suite::TestSuite;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::agent::remote::{ParameterStore, ServiceControl};
use crate::agent::AgentController;
use crate::common::config::PipelineTuning;
use crate::common::{CancelToken, Result};
use crate::dimension::DimensionFactory;
use crate::environment::Metadata;
use crate::metric::fetcher::MetricValueFetcher;
use crate::status::TestGroupResult;

/// How long the agent dwells collecting data unless a runner overrides it
pub const DEFAULT_RUN_DURATION: Duration = Duration::from_secs(30);

/// Everything a runner and its strategy need, built once at startup.
/// The remote control-plane handles are only populated for ECS runs.
pub struct HarnessContext {
    pub metadata: Metadata,
    pub factory: DimensionFactory,
    pub fetcher: MetricValueFetcher,
    pub tuning: PipelineTuning,
    pub agent: Arc<dyn AgentController>,
    pub parameter_store: Option<Arc<dyn ParameterStore>>,
    pub service_control: Option<Arc<dyn ServiceControl>>,
    pub cancel: CancelToken,
}

/// One end-to-end test against the agent
#[async_trait]
pub trait TestRunner: Send + Sync {
    fn test_name(&self) -> &str;

    /// Agent configuration artifact to deploy before the run.
    /// `None` means the test runs against whatever config is already active.
    fn agent_config_file(&self) -> Option<PathBuf> {
        None
    }

    /// How long the agent collects before validation
    fn run_duration(&self) -> Duration {
        DEFAULT_RUN_DURATION
    }

    /// Metric names this runner validates, for logging and selection
    fn measured_metrics(&self) -> Vec<String>;

    /// Runs before the agent is (re)started
    async fn setup_before_run(&mut self, _ctx: &HarnessContext) -> Result<()> {
        Ok(())
    }

    /// Runs after the agent is started, before the dwell. Background load
    /// generators belong here so they emit while the agent collects.
    async fn setup_after_run(&mut self, _ctx: &HarnessContext) -> Result<()> {
        Ok(())
    }

    /// Inspect the backend and produce the verdicts for this test
    async fn validate(&mut self, ctx: &HarnessContext) -> TestGroupResult;
}
