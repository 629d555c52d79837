//! telemetry-harness - end-to-end validation for a telemetry agent
//!
//! Builds the runner suite from CLI flags, executes it against the agent on
//! this host (or cluster), prints the result tree, and exits non-zero when
//! any group failed.

use std::sync::Arc;

use clap::Parser;

use telemetry_harness::agent::remote::{AwsCli, ParameterStore, ServiceControl};
use telemetry_harness::agent::LocalAgent;
use telemetry_harness::backend::HttpMetricsBackend;
use telemetry_harness::cli::Cli;
use telemetry_harness::common::{cancel_pair, logging, Config, Error, Result};
use telemetry_harness::dimension::DimensionFactory;
use telemetry_harness::environment::ComputeType;
use telemetry_harness::metric::fetcher::MetricValueFetcher;
use telemetry_harness::runner::append_dimensions::AppendDimensionsTestRunner;
use telemetry_harness::runner::cpu::CpuTestRunner;
use telemetry_harness::runner::statsd::{StatsdTestRunner, STATSD_RUN_DURATION};
use telemetry_harness::runner::{HarnessContext, TestRunner, TestSuite, DEFAULT_RUN_DURATION};
use telemetry_harness::status::TestStatus;

#[tokio::main]
async fn main() {
    // Hold the appender guard so file logs flush on exit
    let _guard = logging::init();

    match run().await {
        Ok(TestStatus::Successful) => {}
        Ok(TestStatus::Failed) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}

async fn run() -> Result<TestStatus> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let metadata = cli.metadata()?;
    let factory = DimensionFactory::new(metadata.clone());
    let backend = Arc::new(HttpMetricsBackend::new(config.backend.endpoint.clone()));
    let fetcher = MetricValueFetcher::new(backend);
    let agent = Arc::new(LocalAgent::new(config.agent.clone()));

    // Remote control-plane handles are only needed (and required) on ECS.
    let (parameter_store, service_control) = if metadata.compute_type() == ComputeType::Ecs {
        let aws = Arc::new(AwsCli::discover(metadata.region.clone())?);
        (
            Some(aws.clone() as Arc<dyn ParameterStore>),
            Some(aws as Arc<dyn ServiceControl>),
        )
    } else {
        (None, None)
    };

    let mut runners: Vec<Box<dyn TestRunner>> = Vec::new();
    if cli.selected("cpu") {
        runners.push(Box::new(CpuTestRunner::new(
            cli.namespace.clone(),
            cli.agent_config("cpu.json"),
            cli.run_duration_override().unwrap_or(DEFAULT_RUN_DURATION),
        )));
    }
    if cli.selected("statsd") {
        runners.push(Box::new(StatsdTestRunner::new(
            cli.namespace.clone(),
            cli.agent_config("statsd.json"),
            cli.run_duration_override().unwrap_or(STATSD_RUN_DURATION),
        )));
    }
    if cli.selected("append_dimensions") {
        runners.push(Box::new(AppendDimensionsTestRunner::new(
            cli.namespace.clone(),
            cli.agent_config("append_dimensions.json"),
            cli.run_duration_override().unwrap_or(DEFAULT_RUN_DURATION),
        )));
    }

    let mut suite = TestSuite::new(runners);
    if suite.is_empty() {
        return Err(Error::Config(format!(
            "no test groups match the selection {:?}",
            cli.tests
        )));
    }

    let (cancel_handle, cancel_token) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping after the current runner");
            cancel_handle.cancel();
        }
    });

    let ctx = HarnessContext {
        metadata,
        factory,
        fetcher,
        tuning: config.pipelines.clone(),
        agent,
        parameter_store,
        service_control,
        cancel: cancel_token,
    };

    let result = suite.run(&ctx).await;
    result.print();
    Ok(result.get_status())
}
