//! Sequential suite orchestration
//!
//! Runners execute one at a time against the shared agent; a failing group
//! never aborts the rest of the suite. Cancellation is honored between
//! runners, and inside validation retry loops, but never interrupts an
//! in-flight agent run.

use tracing::{info, warn};

use crate::status::{TestGroupResult, TestResult, TestStatus, TestSuiteResult};

use super::strategy::RunStrategy;
use super::{for_compute_type, HarnessContext, TestRunner};

/// Ordered collection of runners sharing one harness context
pub struct TestSuite {
    runners: Vec<Box<dyn TestRunner>>,
}

impl TestSuite {
    pub fn new(runners: Vec<Box<dyn TestRunner>>) -> Self {
        Self { runners }
    }

    pub fn is_empty(&self) -> bool {
        self.runners.is_empty()
    }

    /// Run every runner in order and collect their group results
    pub async fn run(&mut self, ctx: &HarnessContext) -> TestSuiteResult {
        let strategy = for_compute_type(ctx.metadata.compute_type());
        let mut suite = TestSuiteResult::default();

        for runner in &mut self.runners {
            if ctx.cancel.is_cancelled() {
                warn!("cancellation requested, skipping remaining runners");
                break;
            }

            let group = run_one(strategy.as_ref(), runner.as_mut(), ctx).await;
            if group.get_status() == TestStatus::Failed {
                warn!(group = %group.name, "test group failed");
            } else {
                info!(group = %group.name, "test group passed");
            }
            suite.test_group_results.push(group);
        }

        suite
    }
}

async fn run_one(
    strategy: &dyn RunStrategy,
    runner: &mut dyn TestRunner,
    ctx: &HarnessContext,
) -> TestGroupResult {
    info!(
        test = runner.test_name(),
        metrics = ?runner.measured_metrics(),
        "starting test group"
    );

    if let Err(e) = runner.setup_before_run(ctx).await {
        let mut group = TestGroupResult::new(runner.test_name());
        group.test_results.push(TestResult::failed(
            "Setup Before Run",
            crate::common::Error::SetupBeforeRun(e.to_string()),
        ));
        return group;
    }

    let outcome = strategy.run(runner, ctx).await;
    let mut group = outcome.group;

    // A fatal lifecycle error means there is no data worth validating.
    if outcome.fatal.is_some() {
        return group;
    }

    let validated = runner.validate(ctx).await;
    group.test_results.extend(validated.test_results);
    group
}
