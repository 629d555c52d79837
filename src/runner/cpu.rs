//! Host CPU metric validation
//!
//! Verifies the agent's host pipeline reports the per-cpu usage set under
//! the current instance's dimensions. Usage percentages have no stable
//! expected value, so the floor is zero: the series must exist in the window
//! and carry no negative values.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::dimension::Instruction;
use crate::metric::presence::dimensions_present;
use crate::status::TestGroupResult;

use super::{HarnessContext, TestRunner};

const CPU_METRICS: [&str; 10] = [
    "cpu_usage_idle",
    "cpu_usage_user",
    "cpu_usage_system",
    "cpu_usage_active",
    "cpu_usage_iowait",
    "cpu_usage_nice",
    "cpu_usage_irq",
    "cpu_usage_softirq",
    "cpu_usage_steal",
    "cpu_usage_guest",
];

pub struct CpuTestRunner {
    namespace: String,
    config_path: Option<PathBuf>,
    run_duration: Duration,
}

impl CpuTestRunner {
    pub fn new(
        namespace: impl Into<String>,
        config_path: Option<PathBuf>,
        run_duration: Duration,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            config_path,
            run_duration,
        }
    }
}

#[async_trait]
impl TestRunner for CpuTestRunner {
    fn test_name(&self) -> &str {
        "cpu"
    }

    fn agent_config_file(&self) -> Option<PathBuf> {
        self.config_path.clone()
    }

    fn run_duration(&self) -> Duration {
        self.run_duration
    }

    fn measured_metrics(&self) -> Vec<String> {
        CPU_METRICS.iter().map(|m| m.to_string()).collect()
    }

    async fn validate(&mut self, ctx: &HarnessContext) -> TestGroupResult {
        let mut group = TestGroupResult::new(self.test_name());
        let instructions = [Instruction::unknown("InstanceId")];

        for metric in CPU_METRICS {
            let result = dimensions_present(
                &ctx.fetcher,
                &ctx.factory,
                &self.namespace,
                metric,
                &instructions,
            )
            .await;
            group.test_results.push(result);
        }

        group
    }
}
