//! Global append_dimensions validation
//!
//! Under a global append_dimensions configuration the agent tags every
//! metric with the instance identity and drops the default "host" dimension.
//! Both halves are load-bearing: the metric must be found under the appended
//! dimensions AND must yield nothing under the host dimension for the same
//! window.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::dimension::Instruction;
use crate::metric::presence::global_append_dimensions;
use crate::status::TestGroupResult;

use super::{HarnessContext, TestRunner};

const APPEND_DIMENSION_METRICS: [&str; 2] = ["mem_used_percent", "swap_used_percent"];

pub struct AppendDimensionsTestRunner {
    namespace: String,
    config_path: Option<PathBuf>,
    run_duration: Duration,
}

impl AppendDimensionsTestRunner {
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
impl TestRunner for AppendDimensionsTestRunner {
    fn test_name(&self) -> &str {
        "append_dimensions"
    }

    fn agent_config_file(&self) -> Option<PathBuf> {
        self.config_path.clone()
    }

    fn run_duration(&self) -> Duration {
        self.run_duration
    }

    fn measured_metrics(&self) -> Vec<String> {
        APPEND_DIMENSION_METRICS
            .iter()
            .map(|m| m.to_string())
            .collect()
    }

    async fn validate(&mut self, ctx: &HarnessContext) -> TestGroupResult {
        let mut group = TestGroupResult::new(self.test_name());

        let appended = [
            Instruction::unknown("InstanceId"),
            Instruction::unknown("InstanceType"),
            Instruction::unknown("ImageId"),
        ];
        let dropped = [Instruction::unknown("host")];

        for metric in APPEND_DIMENSION_METRICS {
            let result = global_append_dimensions(
                &ctx.fetcher,
                &ctx.factory,
                &self.namespace,
                metric,
                &appended,
                &dropped,
            )
            .await;
            group.test_results.push(result);
        }

        group
    }
}
