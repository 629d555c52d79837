//! Per-compute-type agent lifecycle strategies
//!
//! A strategy walks the agent through one run: push the runner's config,
//! (re)start, run the post-start setup hook, dwell while data is collected,
//! and tear down. The dwell is a plain sleep on purpose: cancelling mid-dwell
//! would leave the agent started but unvalidated.
//!
//! Every strategy records a "Starting Agent" result. A fatal error in the
//! outcome tells the orchestrator to skip validation entirely; non-fatal
//! teardown failures become Failed results but validation still runs.

use async_trait::async_trait;
use tracing::{error, info};

use crate::common::Error;
use crate::environment::ComputeType;
use crate::status::{TestGroupResult, TestResult};

use super::{HarnessContext, TestRunner};

const STARTING_AGENT: &str = "Starting Agent";

/// What a strategy produced: the lifecycle results so far, and the error
/// that aborted the run, if any.
pub struct RunOutcome {
    pub group: TestGroupResult,
    pub fatal: Option<Error>,
}

impl RunOutcome {
    fn completed(group: TestGroupResult) -> Self {
        Self { group, fatal: None }
    }

    fn aborted(mut group: TestGroupResult, error: Error) -> Self {
        error!(error = %error, "agent run aborted");
        group
            .test_results
            .push(TestResult::failed(STARTING_AGENT, &error));
        Self {
            group,
            fatal: Some(error),
        }
    }
}

/// Drives the agent through one runner's lifecycle
#[async_trait]
pub trait RunStrategy: Send + Sync {
    async fn run(&self, runner: &mut dyn TestRunner, ctx: &HarnessContext) -> RunOutcome;
}

/// The strategy for the current compute platform
pub fn for_compute_type(compute_type: ComputeType) -> Box<dyn RunStrategy> {
    match compute_type {
        ComputeType::Ec2 => Box::new(LocalRunStrategy),
        ComputeType::Ecs => Box::new(EcsRunStrategy),
        ComputeType::Eks => Box::new(EksRunStrategy),
    }
}

async fn run_post_start_hook(
    runner: &mut dyn TestRunner,
    ctx: &HarnessContext,
) -> Result<(), Error> {
    runner
        .setup_after_run(ctx)
        .await
        .map_err(|e| Error::SetupAfterRun(e.to_string()))
}

/// Agent installed on the local host (EC2)
///
/// deploy config → start → post-start hook → dwell → stop → remove config.
/// A start failure is fatal; stop and cleanup failures fail the group but
/// validation still runs against whatever data was collected.
pub struct LocalRunStrategy;

#[async_trait]
impl RunStrategy for LocalRunStrategy {
    async fn run(&self, runner: &mut dyn TestRunner, ctx: &HarnessContext) -> RunOutcome {
        let mut group = TestGroupResult::new(runner.test_name());
        let config = runner.agent_config_file();

        if let Some(path) = &config {
            if let Err(e) = ctx.agent.deploy(path).await {
                return RunOutcome::aborted(group, e);
            }
        }

        if let Err(e) = ctx.agent.start().await {
            // The config is already deployed; it must not leak into the
            // next run even though this one is aborted.
            if config.is_some() {
                if let Err(cleanup_err) = ctx.agent.cleanup().await {
                    group
                        .test_results
                        .push(TestResult::failed("Removing Agent Config", &cleanup_err));
                }
            }
            return RunOutcome::aborted(group, e);
        }
        group.test_results.push(TestResult::successful(STARTING_AGENT));

        if let Err(e) = run_post_start_hook(runner, ctx).await {
            return RunOutcome::aborted(group, e);
        }

        let dwell = runner.run_duration();
        info!(test = runner.test_name(), ?dwell, "agent running, dwelling for data collection");
        tokio::time::sleep(dwell).await;

        if let Err(e) = ctx.agent.stop().await {
            group
                .test_results
                .push(TestResult::failed("Stopping Agent", &e));
        }

        if config.is_some() {
            if let Err(e) = ctx.agent.cleanup().await {
                group
                    .test_results
                    .push(TestResult::failed("Removing Agent Config", &e));
            }
        }

        RunOutcome::completed(group)
    }
}

/// Agent running as an ECS daemon service
///
/// Config travels through the parameter store; the restart is triggered as a
/// new deployment and there is no completion signal, so the strategy sleeps a
/// fixed settle duration before handing over to validation. A runner without
/// a config artifact skips the push/restart and dwells normally.
pub struct EcsRunStrategy;

#[async_trait]
impl RunStrategy for EcsRunStrategy {
    async fn run(&self, runner: &mut dyn TestRunner, ctx: &HarnessContext) -> RunOutcome {
        let mut group = TestGroupResult::new(runner.test_name());

        match runner.agent_config_file() {
            Some(path) => {
                let content = match tokio::fs::read_to_string(&path).await {
                    Ok(content) => content,
                    Err(e) => {
                        return RunOutcome::aborted(
                            group,
                            Error::config_deploy(&path.display().to_string(), e),
                        )
                    }
                };

                let (Some(store), Some(control)) =
                    (&ctx.parameter_store, &ctx.service_control)
                else {
                    return RunOutcome::aborted(
                        group,
                        Error::Config(
                            "ECS run requires parameter store and service control handles"
                                .to_string(),
                        ),
                    );
                };

                let parameter = &ctx.metadata.config_parameter_name;
                if let Err(e) = store.put_parameter(parameter, &content).await {
                    return RunOutcome::aborted(group, e);
                }

                if let Err(e) = control
                    .restart_daemon_service(
                        &ctx.metadata.ecs_cluster_arn,
                        &ctx.metadata.ecs_service_name,
                    )
                    .await
                {
                    return RunOutcome::aborted(group, e);
                }
                group.test_results.push(TestResult::successful(STARTING_AGENT));

                if let Err(e) = run_post_start_hook(runner, ctx).await {
                    return RunOutcome::aborted(group, e);
                }

                let settle = ctx.tuning.ecs_restart_settle();
                info!(test = runner.test_name(), ?settle, "daemon service restarted, waiting to settle");
                tokio::time::sleep(settle).await;
            }
            None => {
                // No reconfiguration: the running deployment is the subject.
                group.test_results.push(TestResult::successful(STARTING_AGENT));

                if let Err(e) = run_post_start_hook(runner, ctx).await {
                    return RunOutcome::aborted(group, e);
                }

                tokio::time::sleep(runner.run_duration()).await;
            }
        }

        RunOutcome::completed(group)
    }
}

/// Agent deployed to an EKS cluster out of band
///
/// The harness has no lifecycle control here; it only waits out the run
/// duration so the agent has data in the window.
pub struct EksRunStrategy;

#[async_trait]
impl RunStrategy for EksRunStrategy {
    async fn run(&self, runner: &mut dyn TestRunner, ctx: &HarnessContext) -> RunOutcome {
        let mut group = TestGroupResult::new(runner.test_name());
        group.test_results.push(TestResult::successful(STARTING_AGENT));

        if let Err(e) = run_post_start_hook(runner, ctx).await {
            return RunOutcome::aborted(group, e);
        }

        let dwell = runner.run_duration();
        info!(test = runner.test_name(), ?dwell, "waiting for cluster agent to emit");
        tokio::time::sleep(dwell).await;

        RunOutcome::completed(group)
    }
}
