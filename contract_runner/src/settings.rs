//! Layered runtime settings.
//!
//! Values are merged in increasing precedence: built-in defaults, the first
//! discovered configuration file, `CONTRACT_RUNNER_*` environment variables
//! and finally command-line flags. The merged result is validated before any
//! collaborator is built from it.

use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::figment::Figment;
use ortho_config::figment::providers::{Env, Serialized};
use ortho_config::{ConfigDiscovery, OrthoError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::contract_server::HttpContractServer;
use crate::error::RunnerError;
use crate::scenario::{ExecutorConfig, ProcessScenarioExecutor, Readiness};

/// Application name used for configuration discovery.
pub const APP_NAME: &str = "contract_runner";

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "CONTRACT_RUNNER_";

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "CONTRACT_RUNNER_CONFIG_PATH";

/// Fully merged settings for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSettings {
    /// Contract server host name.
    pub host: String,
    /// Contract server port.
    pub port: u16,
    /// Per-request timeout for contract server calls, in milliseconds.
    pub http_timeout_ms: u64,
    /// Scenario runner program.
    pub runner: String,
    /// Feature directory passed to the runner.
    pub features_dir: Utf8PathBuf,
    /// Report format passed to the runner.
    pub report_format: String,
    /// Directory receiving per-scenario reports.
    pub results_dir: Utf8PathBuf,
    /// Step-implementation program launched before each scenario.
    pub steps: String,
    /// Wall-clock budget for one runner invocation, in milliseconds.
    pub runner_timeout_ms: u64,
    /// Address the step process listens on once ready; unset skips the wait.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps_ready_address: Option<String>,
    /// Upper bound on the readiness wait, in milliseconds.
    pub steps_ready_timeout_ms: u64,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 8090,
            http_timeout_ms: 30_000,
            runner: "cucumber".to_owned(),
            features_dir: Utf8PathBuf::from("features"),
            report_format: "junit".to_owned(),
            results_dir: Utf8PathBuf::from("results"),
            steps: "./steps".to_owned(),
            runner_timeout_ms: 30 * 60 * 1_000,
            steps_ready_address: None,
            steps_ready_timeout_ms: 10_000,
        }
    }
}

/// Command-line values layered over every other source.
///
/// Absent values are skipped so lower layers show through.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct CliOverrides<'a> {
    /// Contract server host name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<&'a str>,
    /// Contract server port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Directory receiving per-scenario reports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_dir: Option<&'a Utf8Path>,
    /// Scenario runner program.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runner: Option<&'a str>,
    /// Step-implementation program.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<&'a str>,
}

impl RunnerSettings {
    /// Loads and validates settings from every layer.
    ///
    /// When `config_path` is given the file must exist; otherwise the first
    /// file found by discovery is used, if any.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Configuration`] when a file cannot be loaded
    /// or the merged values do not deserialise, and
    /// [`RunnerError::InvalidSetting`] when validation fails.
    pub fn load(
        overrides: &CliOverrides<'_>,
        config_path: Option<&Utf8Path>,
    ) -> Result<Self, RunnerError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = discover_config(config_path)? {
            figment = figment.merge(file);
        }
        figment = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(overrides));

        let settings: Self = figment
            .extract()
            .map_err(|err| Arc::new(OrthoError::merge(err)))?;
        settings.validate()?;
        debug!(?settings, "settings resolved");
        Ok(settings)
    }

    /// Checks the merged values for consistency.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::InvalidSetting`] naming the first bad key.
    pub fn validate(&self) -> Result<(), RunnerError> {
        require_text("host", &self.host)?;
        require_text("runner", &self.runner)?;
        require_text("steps", &self.steps)?;
        require_text("report_format", &self.report_format)?;
        require_positive("http_timeout_ms", self.http_timeout_ms)?;
        require_positive("runner_timeout_ms", self.runner_timeout_ms)?;
        if let Some(address) = &self.steps_ready_address {
            require_text("steps_ready_address", address)?;
            require_positive("steps_ready_timeout_ms", self.steps_ready_timeout_ms)?;
        }
        Ok(())
    }

    /// Builds the HTTP contract server client.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Http`] when the client cannot be constructed.
    pub fn contract_server(&self) -> Result<HttpContractServer, RunnerError> {
        HttpContractServer::new(
            &self.host,
            self.port,
            Duration::from_millis(self.http_timeout_ms),
        )
    }

    /// Describes how scenarios are executed.
    #[must_use]
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            runner: self.runner.clone(),
            features_dir: self.features_dir.clone(),
            report_format: self.report_format.clone(),
            results_dir: self.results_dir.clone(),
            steps: self.steps.clone(),
            runner_timeout: Duration::from_millis(self.runner_timeout_ms),
            readiness: self.steps_ready_address.as_ref().map(|address| Readiness {
                address: address.clone(),
                timeout: Duration::from_millis(self.steps_ready_timeout_ms),
            }),
        }
    }

    /// Builds the process-backed scenario executor.
    #[must_use]
    pub fn scenario_executor(&self) -> ProcessScenarioExecutor {
        ProcessScenarioExecutor::new(self.executor_config())
    }
}

fn discover_config(explicit: Option<&Utf8Path>) -> Result<Option<Figment>, RunnerError> {
    let mut builder = ConfigDiscovery::builder(APP_NAME).env_var(CONFIG_PATH_ENV);
    if let Some(path) = explicit {
        builder = builder.add_required_path(path.as_std_path());
    }
    let outcome = builder.build().load_first_partitioned();

    if let Some(err) = OrthoError::try_aggregate(outcome.required_errors) {
        return Err(Arc::new(err).into());
    }
    if outcome.figment.is_some() {
        return Ok(outcome.figment);
    }
    OrthoError::try_aggregate(outcome.optional_errors)
        .map_or(Ok(None), |err| Err(Arc::new(err).into()))
}

fn require_text(key: &'static str, value: &str) -> Result<(), RunnerError> {
    if value.trim().is_empty() {
        return Err(RunnerError::InvalidSetting {
            key,
            message: "must not be empty".to_owned(),
        });
    }
    Ok(())
}

fn require_positive(key: &'static str, value: u64) -> Result<(), RunnerError> {
    if value == 0 {
        return Err(RunnerError::InvalidSetting {
            key,
            message: "must be greater than zero".to_owned(),
        });
    }
    Ok(())
}
