//! Scenario execution through the external step process and runner.
//!
//! Each run launches the step-implementation program in the background and
//! then invokes the scenario runner for exactly one named scenario, writing
//! its report under the scenario's digest directory. The step process is
//! neither awaited nor torn down; only finished step processes are reaped
//! when the executor is dropped.

use std::cell::RefCell;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use camino::Utf8PathBuf;
use tracing::{debug, info, warn};

use crate::error::RunnerError;
use crate::fs_helpers::ensure_dir;
use crate::process::{WaitOutcome, wait_for_listener, wait_with_timeout};
use crate::results::report_location;

/// Outcome of running a single scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioStatus {
    /// The runner exited successfully.
    Passed,
    /// The runner exited unsuccessfully; `code` is absent when it was
    /// terminated by a signal.
    Failed {
        /// Exit code reported by the runner.
        code: Option<i32>,
    },
    /// The runner exceeded its time budget and was killed.
    TimedOut,
}

impl ScenarioStatus {
    /// Returns `true` only for [`ScenarioStatus::Passed`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Runs one named scenario.
pub trait ScenarioExecutor {
    /// Executes `scenario` and reports whether it passed.
    ///
    /// A failing scenario is a [`ScenarioStatus`], not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`RunnerError`] when the harness itself cannot run the
    /// scenario, for example when the runner cannot be spawned.
    fn run(&self, scenario: &str) -> Result<ScenarioStatus, RunnerError>;
}

/// Optional handshake with the step process before the runner starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readiness {
    /// `host:port` the step process listens on once it is ready.
    pub address: String,
    /// Upper bound on the wait.
    pub timeout: Duration,
}

/// Command lines and limits used by [`ProcessScenarioExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Scenario runner program, `cucumber` by default.
    pub runner: String,
    /// Directory of feature files handed to the runner.
    pub features_dir: Utf8PathBuf,
    /// Report format requested from the runner.
    pub report_format: String,
    /// Directory holding one report location per scenario.
    pub results_dir: Utf8PathBuf,
    /// Step-implementation program launched before each scenario.
    pub steps: String,
    /// Wall-clock budget for one runner invocation.
    pub runner_timeout: Duration,
    /// Readiness probe for the step process; `None` skips the wait.
    pub readiness: Option<Readiness>,
}

/// [`ScenarioExecutor`] backed by real child processes.
#[derive(Debug)]
pub struct ProcessScenarioExecutor {
    config: ExecutorConfig,
    background: RefCell<Vec<Child>>,
}

impl ProcessScenarioExecutor {
    /// Creates an executor for the given configuration.
    #[must_use]
    pub const fn new(config: ExecutorConfig) -> Self {
        Self {
            config,
            background: RefCell::new(Vec::new()),
        }
    }

    /// Returns the executor configuration.
    #[must_use]
    pub const fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Arguments passed to the runner for `scenario`.
    #[must_use]
    pub fn runner_args(&self, scenario: &str) -> Vec<String> {
        let report = report_location(&self.config.results_dir, scenario);
        vec![
            self.config.features_dir.to_string(),
            "-n".to_owned(),
            scenario.to_owned(),
            "-f".to_owned(),
            self.config.report_format.clone(),
            "-o".to_owned(),
            report.into_string(),
        ]
    }

    fn launch_steps(&self) -> Result<(), RunnerError> {
        // A step process that fails to launch is only logged; the runner
        // still runs and reports the scenario.
        match Command::new(&self.config.steps)
            .stdin(Stdio::null())
            .spawn()
        {
            Ok(child) => {
                debug!(program = %self.config.steps, pid = child.id(), "step process launched");
                self.background.borrow_mut().push(child);
            }
            Err(err) => {
                warn!(program = %self.config.steps, error = %err, "failed to launch step process");
            }
        }

        if let Some(readiness) = &self.config.readiness {
            if !wait_for_listener(&readiness.address, readiness.timeout) {
                return Err(RunnerError::StepsNotReady {
                    address: readiness.address.clone(),
                    timeout: readiness.timeout,
                });
            }
            debug!(address = %readiness.address, "step process ready");
        }
        Ok(())
    }

    fn invoke_runner(&self, scenario: &str) -> Result<ScenarioStatus, RunnerError> {
        let program = &self.config.runner;
        let mut child = Command::new(program)
            .args(self.runner_args(scenario))
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                program: program.clone(),
                source,
            })?;
        let outcome = wait_with_timeout(&mut child, self.config.runner_timeout).map_err(
            |source| RunnerError::Wait {
                program: program.clone(),
                source,
            },
        )?;

        Ok(match outcome {
            WaitOutcome::Exited(status) if status.success() => ScenarioStatus::Passed,
            WaitOutcome::Exited(status) => ScenarioStatus::Failed {
                code: status.code(),
            },
            WaitOutcome::TimedOut => ScenarioStatus::TimedOut,
        })
    }
}

impl ScenarioExecutor for ProcessScenarioExecutor {
    fn run(&self, scenario: &str) -> Result<ScenarioStatus, RunnerError> {
        ensure_dir(&self.config.results_dir)?;
        self.launch_steps()?;
        info!(scenario, "running scenario");

        let status = self.invoke_runner(scenario)?;
        match status {
            ScenarioStatus::Passed => info!(scenario, "scenario passed"),
            ScenarioStatus::Failed { code } => warn!(scenario, ?code, "scenario failed"),
            ScenarioStatus::TimedOut => warn!(
                scenario,
                timeout = ?self.config.runner_timeout,
                "scenario runner timed out"
            ),
        }
        Ok(status)
    }
}

impl Drop for ProcessScenarioExecutor {
    fn drop(&mut self) {
        // Reap step processes that already exited; leave the rest running.
        self.background
            .get_mut()
            .retain_mut(|child| !matches!(child.try_wait(), Ok(Some(_))));
    }
}
