//! Suite orchestration tests against in-memory fakes
//!
//! These cover the lifecycle contracts: a fatal agent start skips
//! validation, failing groups never abort the suite, the local strategy
//! walks deploy/start/stop/cleanup in order, and the ECS strategy only
//! touches the parameter store when a runner ships a config artifact.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use telemetry_harness::agent::remote::{ParameterStore, ServiceControl};
use telemetry_harness::agent::AgentController;
use telemetry_harness::backend::{
    MetricDataQuery, MetricIdentity, MetricListQuery, MetricsBackend,
};
use telemetry_harness::common::config::PipelineTuning;
use telemetry_harness::common::{CancelToken, Error, Result};
use telemetry_harness::dimension::{DimensionFactory, Instruction};
use telemetry_harness::environment::{ComputeType, Metadata};
use telemetry_harness::metric::fetcher::MetricValueFetcher;
use telemetry_harness::metric::presence::{dimensions_absent, dimensions_present};
use telemetry_harness::runner::{HarnessContext, TestRunner, TestSuite};
use telemetry_harness::status::{TestGroupResult, TestResult, TestStatus};

// --- fakes ---------------------------------------------------------------

/// Backend keyed by metric name + dimension set, counting data queries
#[derive(Default)]
struct FakeBackend {
    data: HashMap<String, Vec<f64>>,
    data_queries: Mutex<usize>,
}

impl FakeBackend {
    fn series_key(metric_name: &str, dims: &[telemetry_harness::dimension::Dimension]) -> String {
        let mut parts: Vec<String> =
            dims.iter().map(|d| format!("{}={}", d.name, d.value)).collect();
        parts.sort();
        format!("{metric_name}|{}", parts.join(","))
    }

    fn with_series(
        mut self,
        metric_name: &str,
        dims: &[telemetry_harness::dimension::Dimension],
        values: Vec<f64>,
    ) -> Self {
        self.data.insert(Self::series_key(metric_name, dims), values);
        self
    }
}

#[async_trait]
impl MetricsBackend for FakeBackend {
    async fn get_metric_data(&self, query: &MetricDataQuery) -> Result<Vec<f64>> {
        *self.data_queries.lock().unwrap() += 1;
        let key = Self::series_key(&query.metric_name, &query.dimensions);
        Ok(self.data.get(&key).cloned().unwrap_or_default())
    }

    async fn list_metrics(&self, _query: &MetricListQuery) -> Result<Vec<MetricIdentity>> {
        Ok(Vec::new())
    }
}

/// Agent recording lifecycle calls, with optional injected failures
#[derive(Default)]
struct FakeAgent {
    calls: Mutex<Vec<&'static str>>,
    fail_start: bool,
    fail_cleanup: bool,
}

impl FakeAgent {
    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentController for FakeAgent {
    async fn deploy(&self, _config_artifact: &Path) -> Result<()> {
        self.calls.lock().unwrap().push("deploy");
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        self.calls.lock().unwrap().push("start");
        if self.fail_start {
            return Err(Error::AgentStartFailed("ctl exited with 1".to_string()));
        }
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.calls.lock().unwrap().push("stop");
        Ok(())
    }

    async fn cleanup(&self) -> Result<()> {
        self.calls.lock().unwrap().push("cleanup");
        if self.fail_cleanup {
            return Err(Error::cleanup("/opt/agent/config.json", "permission denied"));
        }
        Ok(())
    }
}

#[derive(Default)]
struct FakeParameterStore {
    puts: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ParameterStore for FakeParameterStore {
    async fn put_parameter(&self, name: &str, value: &str) -> Result<()> {
        self.puts
            .lock()
            .unwrap()
            .push((name.to_string(), value.to_string()));
        Ok(())
    }

    async fn get_parameter(&self, name: &str) -> Result<String> {
        let puts = self.puts.lock().unwrap();
        puts.iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| Error::Internal(format!("no parameter {name}")))
    }
}

#[derive(Default)]
struct FakeServiceControl {
    restarts: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ServiceControl for FakeServiceControl {
    async fn restart_daemon_service(&self, cluster_arn: &str, service_name: &str) -> Result<()> {
        self.restarts
            .lock()
            .unwrap()
            .push((cluster_arn.to_string(), service_name.to_string()));
        Ok(())
    }
}

/// Runner with a scripted verdict that records whether validate ran
struct ScriptedRunner {
    name: &'static str,
    config: Option<PathBuf>,
    verdict: TestStatus,
    validated: Arc<AtomicBool>,
}

impl ScriptedRunner {
    fn new(name: &'static str, config: Option<PathBuf>, verdict: TestStatus) -> Self {
        Self {
            name,
            config,
            verdict,
            validated: Arc::new(AtomicBool::new(false)),
        }
    }

    fn validated_flag(&self) -> Arc<AtomicBool> {
        self.validated.clone()
    }
}

#[async_trait]
impl TestRunner for ScriptedRunner {
    fn test_name(&self) -> &str {
        self.name
    }

    fn agent_config_file(&self) -> Option<PathBuf> {
        self.config.clone()
    }

    fn run_duration(&self) -> Duration {
        Duration::from_millis(10)
    }

    fn measured_metrics(&self) -> Vec<String> {
        Vec::new()
    }

    async fn validate(&mut self, _ctx: &HarnessContext) -> TestGroupResult {
        self.validated.store(true, Ordering::SeqCst);
        let mut group = TestGroupResult::new(self.name);
        group.test_results.push(match self.verdict {
            TestStatus::Successful => TestResult::successful("check"),
            TestStatus::Failed => TestResult::failed("check", "scripted failure"),
        });
        group
    }
}

// --- harness plumbing ----------------------------------------------------

fn ec2_metadata() -> Metadata {
    Metadata {
        compute_type: Some(ComputeType::Ec2),
        instance_id: "i-0123456789abcdef0".to_string(),
        instance_type: "t3.medium".to_string(),
        image_id: "ami-12345678".to_string(),
        hostname: "ip-10-0-0-1".to_string(),
        ..Default::default()
    }
}

fn ecs_metadata() -> Metadata {
    Metadata {
        compute_type: Some(ComputeType::Ecs),
        instance_id: "i-0123456789abcdef0".to_string(),
        ecs_cluster_arn: "arn:aws:ecs:us-west-2:123456789012:cluster/integ".to_string(),
        ecs_cluster_name: "integ".to_string(),
        ecs_service_name: "agent-daemon".to_string(),
        config_parameter_name: "/integ/agent-config".to_string(),
        ..Default::default()
    }
}

fn context(
    metadata: Metadata,
    backend: Arc<dyn MetricsBackend>,
    agent: Arc<dyn AgentController>,
) -> HarnessContext {
    // Zero out the waits so lifecycle tests finish quickly.
    let tuning = PipelineTuning {
        validate_retry_interval_secs: 0,
        ecs_restart_settle_secs: 0,
        ..Default::default()
    };
    HarnessContext {
        factory: DimensionFactory::new(metadata.clone()),
        fetcher: MetricValueFetcher::new(backend),
        metadata,
        tuning,
        agent,
        parameter_store: None,
        service_control: None,
        cancel: CancelToken::never(),
    }
}

fn find<'a>(group: &'a TestGroupResult, name: &str) -> &'a TestResult {
    group
        .test_results
        .iter()
        .find(|r| r.name == name)
        .unwrap_or_else(|| panic!("no result named {name} in {:?}", group.test_results))
}

// --- tests ---------------------------------------------------------------

#[tokio::test]
async fn fatal_start_failure_skips_validation() {
    let agent = Arc::new(FakeAgent {
        fail_start: true,
        ..Default::default()
    });
    let config = tempfile::NamedTempFile::new().unwrap();
    let runner = ScriptedRunner::new(
        "cpu",
        Some(config.path().to_path_buf()),
        TestStatus::Successful,
    );
    let validated = runner.validated_flag();

    let ctx = context(ec2_metadata(), Arc::new(FakeBackend::default()), agent.clone());
    let mut suite = TestSuite::new(vec![Box::new(runner)]);
    let result = suite.run(&ctx).await;

    assert_eq!(result.get_status(), TestStatus::Failed);
    let group = &result.test_group_results[0];
    let starting = find(group, "Starting Agent");
    assert_eq!(starting.status, TestStatus::Failed);
    assert!(starting.reason.as_deref().unwrap().contains("could not start"));
    assert!(!validated.load(Ordering::SeqCst), "validate must not run");
    // No dwell or stop after a failed start, but the deployed config is
    // still removed so it cannot leak into the next run.
    assert_eq!(agent.calls(), vec!["deploy", "start", "cleanup"]);
}

#[tokio::test]
async fn leaked_config_after_failed_start_is_recorded() {
    let agent = Arc::new(FakeAgent {
        fail_start: true,
        fail_cleanup: true,
        ..Default::default()
    });
    let config = tempfile::NamedTempFile::new().unwrap();
    let runner = ScriptedRunner::new(
        "cpu",
        Some(config.path().to_path_buf()),
        TestStatus::Successful,
    );

    let ctx = context(ec2_metadata(), Arc::new(FakeBackend::default()), agent.clone());
    let mut suite = TestSuite::new(vec![Box::new(runner)]);
    let result = suite.run(&ctx).await;

    assert_eq!(agent.calls(), vec!["deploy", "start", "cleanup"]);
    let group = &result.test_group_results[0];
    assert_eq!(find(group, "Starting Agent").status, TestStatus::Failed);
    assert_eq!(
        find(group, "Removing Agent Config").status,
        TestStatus::Failed
    );
}

#[tokio::test]
async fn failing_group_does_not_abort_the_suite() {
    let agent = Arc::new(FakeAgent::default());
    let failing = ScriptedRunner::new("first", None, TestStatus::Failed);
    let passing = ScriptedRunner::new("second", None, TestStatus::Successful);
    let second_validated = passing.validated_flag();

    let ctx = context(ec2_metadata(), Arc::new(FakeBackend::default()), agent);
    let mut suite = TestSuite::new(vec![Box::new(failing), Box::new(passing)]);
    let result = suite.run(&ctx).await;

    assert_eq!(result.test_group_results.len(), 2);
    assert_eq!(result.test_group_results[0].get_status(), TestStatus::Failed);
    assert_eq!(
        result.test_group_results[1].get_status(),
        TestStatus::Successful
    );
    assert_eq!(result.get_status(), TestStatus::Failed);
    assert!(second_validated.load(Ordering::SeqCst));
}

#[tokio::test]
async fn local_strategy_walks_the_full_lifecycle() {
    let agent = Arc::new(FakeAgent::default());
    let config = tempfile::NamedTempFile::new().unwrap();
    let runner = ScriptedRunner::new(
        "cpu",
        Some(config.path().to_path_buf()),
        TestStatus::Successful,
    );

    let ctx = context(ec2_metadata(), Arc::new(FakeBackend::default()), agent.clone());
    let mut suite = TestSuite::new(vec![Box::new(runner)]);
    let result = suite.run(&ctx).await;

    assert_eq!(result.get_status(), TestStatus::Successful);
    assert_eq!(agent.calls(), vec!["deploy", "start", "stop", "cleanup"]);
    let group = &result.test_group_results[0];
    assert_eq!(find(group, "Starting Agent").status, TestStatus::Successful);
}

#[tokio::test]
async fn cleanup_failure_fails_the_group_but_validation_still_runs() {
    let agent = Arc::new(FakeAgent {
        fail_cleanup: true,
        ..Default::default()
    });
    let config = tempfile::NamedTempFile::new().unwrap();
    let runner = ScriptedRunner::new(
        "cpu",
        Some(config.path().to_path_buf()),
        TestStatus::Successful,
    );
    let validated = runner.validated_flag();

    let ctx = context(ec2_metadata(), Arc::new(FakeBackend::default()), agent);
    let mut suite = TestSuite::new(vec![Box::new(runner)]);
    let result = suite.run(&ctx).await;

    assert!(validated.load(Ordering::SeqCst));
    let group = &result.test_group_results[0];
    // The scripted check passed, yet the group fails on the leaked config.
    assert_eq!(find(group, "check").status, TestStatus::Successful);
    assert_eq!(
        find(group, "Removing Agent Config").status,
        TestStatus::Failed
    );
    assert_eq!(group.get_status(), TestStatus::Failed);
}

#[tokio::test]
async fn ecs_runner_without_config_skips_the_parameter_store() {
    let store = Arc::new(FakeParameterStore::default());
    let control = Arc::new(FakeServiceControl::default());
    let runner = ScriptedRunner::new("statsd", None, TestStatus::Successful);
    let validated = runner.validated_flag();

    let mut ctx = context(
        ecs_metadata(),
        Arc::new(FakeBackend::default()),
        Arc::new(FakeAgent::default()),
    );
    ctx.parameter_store = Some(store.clone());
    ctx.service_control = Some(control.clone());

    let mut suite = TestSuite::new(vec![Box::new(runner)]);
    let result = suite.run(&ctx).await;

    assert_eq!(result.get_status(), TestStatus::Successful);
    assert!(validated.load(Ordering::SeqCst), "validate must still run");
    assert!(store.puts.lock().unwrap().is_empty());
    assert!(control.restarts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn ecs_config_travels_through_the_parameter_store() {
    let store = Arc::new(FakeParameterStore::default());
    let control = Arc::new(FakeServiceControl::default());

    let config = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(config.path(), r#"{"metrics":{}}"#).unwrap();
    let runner = ScriptedRunner::new(
        "cpu",
        Some(config.path().to_path_buf()),
        TestStatus::Successful,
    );

    let mut ctx = context(
        ecs_metadata(),
        Arc::new(FakeBackend::default()),
        Arc::new(FakeAgent::default()),
    );
    ctx.parameter_store = Some(store.clone());
    ctx.service_control = Some(control.clone());

    let mut suite = TestSuite::new(vec![Box::new(runner)]);
    let result = suite.run(&ctx).await;

    assert_eq!(result.get_status(), TestStatus::Successful);
    let puts = store.puts.lock().unwrap();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].0, "/integ/agent-config");
    assert_eq!(puts[0].1, r#"{"metrics":{}}"#);
    let restarts = control.restarts.lock().unwrap();
    assert_eq!(
        restarts[0],
        (
            "arn:aws:ecs:us-west-2:123456789012:cluster/integ".to_string(),
            "agent-daemon".to_string()
        )
    );
}

#[tokio::test]
async fn cancellation_skips_remaining_runners() {
    let (handle, token) = telemetry_harness::common::cancel_pair();
    handle.cancel();

    let runner = ScriptedRunner::new("cpu", None, TestStatus::Successful);
    let validated = runner.validated_flag();

    let mut ctx = context(
        ec2_metadata(),
        Arc::new(FakeBackend::default()),
        Arc::new(FakeAgent::default()),
    );
    ctx.cancel = token;

    let mut suite = TestSuite::new(vec![Box::new(runner)]);
    let result = suite.run(&ctx).await;

    assert!(result.test_group_results.is_empty());
    assert!(!validated.load(Ordering::SeqCst));
}

#[tokio::test]
async fn unresolved_instruction_fails_without_touching_the_backend() {
    // ClusterName has no provider on EC2, so the instruction set is
    // unsatisfiable and the fetch must be skipped, not attempted partially.
    let backend = Arc::new(FakeBackend::default());
    let factory = DimensionFactory::new(ec2_metadata());
    let fetcher = MetricValueFetcher::new(backend.clone());

    let result = dimensions_present(
        &fetcher,
        &factory,
        "ns",
        "mem_used_percent",
        &[
            Instruction::unknown("InstanceId"),
            Instruction::unknown("ClusterName"),
        ],
    )
    .await;

    assert_eq!(result.status, TestStatus::Failed);
    assert!(result
        .reason
        .as_deref()
        .unwrap()
        .contains("ClusterName"));
    assert_eq!(*backend.data_queries.lock().unwrap(), 0);
}

#[tokio::test]
async fn presence_and_absence_are_complementary_over_the_same_data() {
    use telemetry_harness::dimension::Dimension;

    let metadata = ec2_metadata();
    let appended = vec![Dimension {
        name: "InstanceId".to_string(),
        value: metadata.instance_id.clone(),
    }];
    let backend = Arc::new(
        FakeBackend::default().with_series("mem_used_percent", &appended, vec![42.0, 43.5]),
    );

    let factory = DimensionFactory::new(metadata);
    let fetcher = MetricValueFetcher::new(backend);

    let present = dimensions_present(
        &fetcher,
        &factory,
        "ns",
        "mem_used_percent",
        &[Instruction::unknown("InstanceId")],
    )
    .await;
    assert_eq!(present.status, TestStatus::Successful);

    // The same metric yields nothing under the host dimension.
    let absent = dimensions_absent(
        &fetcher,
        &factory,
        "ns",
        "mem_used_percent",
        &[Instruction::unknown("host")],
    )
    .await;
    assert_eq!(absent.status, TestStatus::Successful);

    // And the two checks flip together: present fails under host...
    let present_under_host = dimensions_present(
        &fetcher,
        &factory,
        "ns",
        "mem_used_percent",
        &[Instruction::unknown("host")],
    )
    .await;
    assert_eq!(present_under_host.status, TestStatus::Failed);

    // ...and absent fails where the data lives.
    let absent_under_instance = dimensions_absent(
        &fetcher,
        &factory,
        "ns",
        "mem_used_percent",
        &[Instruction::unknown("InstanceId")],
    )
    .await;
    assert_eq!(absent_under_instance.status, TestStatus::Failed);
}
