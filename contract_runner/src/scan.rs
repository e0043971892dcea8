//! Line-by-line orchestration of a feature file.
//!
//! Every line goes through the same three steps in a fixed order: contract
//! initialisation, scenario execution, then the expectation check for any
//! contract still awaiting verification. Each marker is validated just before
//! its step runs. Fatal errors stop the scan at the
//! offending line; failing scenarios only mark the suite as failed.

use std::process::ExitCode;

use tracing::{debug, info};

use crate::contract_server::ContractServer;
use crate::directive::{contract_directive, scenario_directive};
use crate::error::RunnerError;
use crate::scenario::ScenarioExecutor;

/// Orchestration flags and counters threaded through the scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanState {
    /// A contract was initialised and its expectations are not yet checked.
    pub pending_contract_check: bool,
    /// At least one scenario has failed. Never cleared once set.
    pub suite_failed: bool,
    /// Number of contracts initialised so far.
    pub contracts_initialised: usize,
    /// Number of scenarios run so far.
    pub scenarios_run: usize,
    /// Number of scenarios that did not pass.
    pub scenarios_failed: usize,
}

/// Result of scanning a whole feature file without a fatal error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuiteOutcome {
    /// Any scenario failed or timed out.
    pub suite_failed: bool,
    /// Number of contracts initialised and verified.
    pub contracts_initialised: usize,
    /// Number of scenarios run.
    pub scenarios_run: usize,
    /// Number of scenarios that did not pass.
    pub scenarios_failed: usize,
}

impl SuiteOutcome {
    /// Process exit code for this outcome: `0` on success, `1` otherwise.
    #[must_use]
    pub fn exit_code(self) -> u8 {
        u8::from(self.suite_failed)
    }
}

impl From<SuiteOutcome> for ExitCode {
    fn from(outcome: SuiteOutcome) -> Self {
        Self::from(outcome.exit_code())
    }
}

impl From<ScanState> for SuiteOutcome {
    fn from(state: ScanState) -> Self {
        Self {
            suite_failed: state.suite_failed,
            contracts_initialised: state.contracts_initialised,
            scenarios_run: state.scenarios_run,
            scenarios_failed: state.scenarios_failed,
        }
    }
}

/// Processes one line and returns the updated state.
///
/// `line_number` is 1-based and only used for error reporting.
///
/// # Errors
///
/// Returns a [`RunnerError`] when the line holds a malformed directive or
/// when contract initialisation, scenario execution or the expectation
/// check fails fatally.
pub fn process_line<S, E>(
    mut state: ScanState,
    line: &str,
    line_number: usize,
    server: &S,
    executor: &E,
) -> Result<ScanState, RunnerError>
where
    S: ContractServer + ?Sized,
    E: ScenarioExecutor + ?Sized,
{
    if let Some(contract) = contract_directive(line, line_number)? {
        debug!(line_number, contract, "contract directive");
        server.init(contract)?;
        state.contracts_initialised += 1;
        state.pending_contract_check = true;
    }

    if let Some(scenario) = scenario_directive(line, line_number)? {
        debug!(line_number, scenario, "scenario directive");
        let status = executor.run(scenario)?;
        state.scenarios_run += 1;
        if !status.is_success() {
            state.scenarios_failed += 1;
            state.suite_failed = true;
        }
    }

    if state.pending_contract_check {
        server.check_expectations()?;
        state.pending_contract_check = false;
    }

    Ok(state)
}

/// Scans `contents` line by line, driving `server` and `executor`.
///
/// # Errors
///
/// Returns the first fatal [`RunnerError`]; later lines are not processed.
pub fn scan_feature<S, E>(contents: &str, server: &S, executor: &E) -> Result<SuiteOutcome, RunnerError>
where
    S: ContractServer + ?Sized,
    E: ScenarioExecutor + ?Sized,
{
    let state = contents
        .lines()
        .enumerate()
        .try_fold(ScanState::default(), |state, (index, line)| {
            process_line(state, line, index + 1, server, executor)
        })?;

    let outcome = SuiteOutcome::from(state);
    info!(
        contracts = outcome.contracts_initialised,
        scenarios = outcome.scenarios_run,
        failed = outcome.scenarios_failed,
        "suite finished"
    );
    Ok(outcome)
}
