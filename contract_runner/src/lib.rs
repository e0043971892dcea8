//! Library interface for `contract-runner`.
//!
//! `contract-runner` reads a feature file, initialises a mock server with the
//! contract named by each `@contract=` tag, runs every `Scenario:` through an
//! external runner and verifies the mock server's expectations after each
//! contract. Collaborators sit behind [`ContractServer`] and
//! [`ScenarioExecutor`] so the scan can be driven without a network or child
//! processes.

pub mod cli;
pub mod contract_server;
pub mod directive;
pub mod error;
pub mod fs_helpers;
pub mod logging;
pub mod process;
pub mod results;
pub mod scan;
pub mod scenario;
pub mod settings;

pub use contract_server::{ContractServer, HttpContractServer};
pub use error::RunnerError;
pub use scan::{ScanState, SuiteOutcome, process_line, scan_feature};
pub use scenario::{ProcessScenarioExecutor, ScenarioExecutor, ScenarioStatus};
pub use settings::{CliOverrides, RunnerSettings};

use tracing::info;

/// Exit code used when the run stops on a fatal error.
pub const FATAL_EXIT_CODE: u8 = 2;

/// Loads settings, reads the feature file and scans it.
///
/// # Errors
///
/// Returns the first fatal [`RunnerError`] raised while loading settings,
/// reading the feature file or processing its lines.
pub fn run(args: &cli::Args) -> Result<SuiteOutcome, RunnerError> {
    let settings = RunnerSettings::load(&args.overrides(), args.config_path.as_deref())?;
    let contents = fs_helpers::read_feature_file(&args.feature_file)?;
    let server = settings.contract_server()?;
    let executor = settings.scenario_executor();

    info!(
        feature = %args.feature_file,
        server = server.base_url(),
        "scanning feature file"
    );
    scan_feature(&contents, &server, &executor)
}
