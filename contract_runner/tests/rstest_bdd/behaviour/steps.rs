//! Step definitions driving a scan against a scripted contract server.

use std::time::Duration;

use anyhow::{Result, anyhow, ensure};
use contract_runner::{HttpContractServer, RunnerError, scan_feature};
use rstest_bdd_macros::{given, then, when};
use test_helpers::mock_server::{MockContractServer, ScriptedResponse, ServerScript};

use crate::fixtures::{OrchestrationWorld, RecordingExecutor};

fn split_list(list: &str) -> Vec<String> {
    list.split(',').map(str::to_owned).collect()
}

#[given("a contract server whose expectations pass")]
fn expectations_pass(orchestration_world: &OrchestrationWorld) {
    orchestration_world.script.set(ServerScript::default());
}

#[given("a contract server whose expectations fail")]
fn expectations_fail(orchestration_world: &OrchestrationWorld) {
    orchestration_world.script.set(ServerScript {
        expect: ScriptedResponse::expectations(true),
        ..ServerScript::default()
    });
}

#[given("a contract server that rejects contract initialisation")]
fn init_rejected(orchestration_world: &OrchestrationWorld) {
    orchestration_world.script.set(ServerScript {
        init: ScriptedResponse::with_status(500),
        ..ServerScript::default()
    });
}

#[given("the runner fails scenario {name}")]
fn runner_fails(orchestration_world: &OrchestrationWorld, name: String) {
    let mut failing = orchestration_world.failing.take().unwrap_or_default();
    failing.push(name);
    orchestration_world.failing.set(failing);
}

#[given("the feature tags contract {name}")]
#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd step macros require owned capture values"
)]
fn tags_contract(orchestration_world: &OrchestrationWorld, name: String) {
    orchestration_world.push_line(format!("  @contract={name}"));
}

#[given("the feature declares scenario {name}")]
#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd step macros require owned capture values"
)]
fn declares_scenario(orchestration_world: &OrchestrationWorld, name: String) {
    orchestration_world.push_line(format!("  Scenario: {name}"));
    orchestration_world.push_line("    Given a step".to_owned());
}

#[given("the feature contains only plain steps")]
fn plain_steps(orchestration_world: &OrchestrationWorld) {
    orchestration_world.push_line("Feature: untagged".to_owned());
    orchestration_world.push_line("  Given a step".to_owned());
}

#[when("the feature is scanned")]
fn scan(orchestration_world: &OrchestrationWorld) -> Result<()> {
    let script = orchestration_world
        .script
        .take()
        .ok_or_else(|| anyhow!("the contract server must be scripted before scanning"))?;
    let contents = orchestration_world
        .lines
        .take()
        .unwrap_or_default()
        .join("\n");
    let failing = orchestration_world.failing.take().unwrap_or_default();

    let server = MockContractServer::start(script)?;
    let client = HttpContractServer::new("127.0.0.1", server.port(), Duration::from_secs(5))?;
    let executor = RecordingExecutor::new(failing.into_iter().collect());

    orchestration_world
        .outcome
        .set(scan_feature(&contents, &client, &executor));
    orchestration_world.requests.set(server.paths());
    orchestration_world.runs.set(executor.runs());
    Ok(())
}

#[then("the suite passes")]
fn suite_passes(orchestration_world: &OrchestrationWorld) -> Result<()> {
    let exit_code = orchestration_world
        .outcome
        .with_ref(|outcome| outcome.as_ref().map(|suite| suite.exit_code()).ok())
        .flatten()
        .ok_or_else(|| anyhow!("the scan must complete without a fatal error"))?;
    ensure!(exit_code == 0, "expected a passing suite, got exit code {exit_code}");
    Ok(())
}

#[then("the suite fails")]
fn suite_fails(orchestration_world: &OrchestrationWorld) -> Result<()> {
    let exit_code = orchestration_world
        .outcome
        .with_ref(|outcome| outcome.as_ref().map(|suite| suite.exit_code()).ok())
        .flatten()
        .ok_or_else(|| anyhow!("the scan must complete without a fatal error"))?;
    ensure!(exit_code == 1, "expected a failing suite, got exit code {exit_code}");
    Ok(())
}

#[then("the run aborts with a contract error")]
fn run_aborts(orchestration_world: &OrchestrationWorld) -> Result<()> {
    let is_contract_error = orchestration_world
        .outcome
        .with_ref(|outcome| {
            matches!(
                outcome,
                Err(RunnerError::ExpectationsFailed { .. } | RunnerError::HttpStatus { .. })
            )
        })
        .ok_or_else(|| anyhow!("the feature must be scanned first"))?;
    ensure!(is_contract_error, "expected the scan to stop on a contract error");
    Ok(())
}

#[then("the contract server received {paths}")]
#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd step macros require owned capture values"
)]
fn server_received(orchestration_world: &OrchestrationWorld, paths: String) -> Result<()> {
    let requests = orchestration_world
        .requests
        .get()
        .ok_or_else(|| anyhow!("the feature must be scanned first"))?;
    let expected = split_list(&paths);
    ensure!(requests == expected, "expected requests {expected:?}, got {requests:?}");
    Ok(())
}

#[then("the contract server was not contacted")]
fn server_untouched(orchestration_world: &OrchestrationWorld) -> Result<()> {
    let requests = orchestration_world
        .requests
        .get()
        .ok_or_else(|| anyhow!("the feature must be scanned first"))?;
    ensure!(requests.is_empty(), "unexpected requests {requests:?}");
    Ok(())
}

#[then("the scenarios run were {names}")]
#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd step macros require owned capture values"
)]
fn scenarios_run(orchestration_world: &OrchestrationWorld, names: String) -> Result<()> {
    let runs = orchestration_world
        .runs
        .get()
        .ok_or_else(|| anyhow!("the feature must be scanned first"))?;
    let expected = split_list(&names);
    ensure!(runs == expected, "expected scenarios {expected:?}, got {runs:?}");
    Ok(())
}

#[then("no scenarios were run")]
fn no_scenarios_run(orchestration_world: &OrchestrationWorld) -> Result<()> {
    let runs = orchestration_world
        .runs
        .get()
        .ok_or_else(|| anyhow!("the feature must be scanned first"))?;
    ensure!(runs.is_empty(), "unexpected scenario runs {runs:?}");
    Ok(())
}
