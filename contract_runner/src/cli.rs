//! Command-line interface definitions for `contract-runner`.

use camino::Utf8PathBuf;
use clap::Parser;

use crate::settings::CliOverrides;

/// Parsed CLI arguments for `contract-runner`.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "contract-runner")]
#[command(about = "Run feature-file scenarios against contract-checked mock servers")]
#[command(version)]
pub struct Args {
    /// Feature file to scan for contract and scenario directives.
    #[arg(value_name = "FEATURE_FILE")]
    pub feature_file: Utf8PathBuf,
    /// Contract server host name.
    #[arg(value_name = "HOSTNAME")]
    pub hostname: Option<String>,
    /// Contract server port.
    #[arg(long)]
    pub port: Option<u16>,
    /// Configuration file to load instead of the discovered one.
    #[arg(long = "config", value_name = "path")]
    pub config_path: Option<Utf8PathBuf>,
    /// Directory receiving per-scenario reports.
    #[arg(long, value_name = "path")]
    pub results_dir: Option<Utf8PathBuf>,
    /// Scenario runner program.
    #[arg(long, value_name = "program")]
    pub runner: Option<String>,
    /// Step-implementation program launched before each scenario.
    #[arg(long, value_name = "program")]
    pub steps: Option<String>,
}

impl Args {
    /// Values that override every other configuration layer.
    #[must_use]
    pub fn overrides(&self) -> CliOverrides<'_> {
        CliOverrides {
            host: self.hostname.as_deref(),
            port: self.port,
            results_dir: self.results_dir.as_deref(),
            runner: self.runner.as_deref(),
            steps: self.steps.as_deref(),
        }
    }
}
