//! Scenario state shared by the orchestration steps.

use std::cell::RefCell;
use std::collections::HashSet;

use contract_runner::{RunnerError, ScenarioExecutor, ScenarioStatus, SuiteOutcome};
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;
use test_helpers::mock_server::ServerScript;

/// Executor that records scenario names and fails the scripted ones.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    failing: HashSet<String>,
    runs: RefCell<Vec<String>>,
}

impl RecordingExecutor {
    pub fn new(failing: HashSet<String>) -> Self {
        Self {
            failing,
            runs: RefCell::default(),
        }
    }

    pub fn runs(&self) -> Vec<String> {
        self.runs.borrow().clone()
    }
}

impl ScenarioExecutor for RecordingExecutor {
    fn run(&self, scenario: &str) -> Result<ScenarioStatus, RunnerError> {
        self.runs.borrow_mut().push(scenario.to_owned());
        if self.failing.contains(scenario) {
            Ok(ScenarioStatus::Failed { code: Some(1) })
        } else {
            Ok(ScenarioStatus::Passed)
        }
    }
}

/// Per-scenario world for the orchestration feature.
#[derive(Debug, Default, ScenarioState)]
pub struct OrchestrationWorld {
    /// Responses the mock contract server will serve.
    pub script: Slot<ServerScript>,
    /// Lines of the feature file under test.
    pub lines: Slot<Vec<String>>,
    /// Scenario names whose runner exits non-zero.
    pub failing: Slot<Vec<String>>,
    /// Result of the scan.
    pub outcome: Slot<Result<SuiteOutcome, RunnerError>>,
    /// Request targets seen by the mock server.
    pub requests: Slot<Vec<String>>,
    /// Scenario names handed to the executor.
    pub runs: Slot<Vec<String>>,
}

impl OrchestrationWorld {
    /// Appends a line to the feature file under test.
    pub fn push_line(&self, line: String) {
        let mut lines = self.lines.take().unwrap_or_default();
        lines.push(line);
        self.lines.set(lines);
    }
}

/// Provides a fresh world for every scenario.
#[fixture]
pub fn orchestration_world() -> OrchestrationWorld {
    OrchestrationWorld::default()
}
