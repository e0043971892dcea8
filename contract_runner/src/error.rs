//! Error types for `contract-runner`.
//!
//! Every variant of [`RunnerError`] is fatal: it means the harness itself is
//! inconsistent and the run must stop. A scenario whose runner exits non-zero
//! is not an error; it is reported through
//! [`crate::scenario::ScenarioStatus`] and aggregated by the scanner.

use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::directive::DirectiveKind;

/// Errors that abort an orchestration run.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Wraps configuration discovery and merge failures from `ortho_config`.
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),

    /// A merged setting failed validation.
    #[error("invalid setting `{key}`: {message}")]
    InvalidSetting {
        /// Settings key that failed validation.
        key: &'static str,
        /// Human-readable reason.
        message: String,
    },

    /// A directive line could not be parsed.
    #[error("malformed {kind} directive on line {line_number}: {line:?}")]
    MalformedDirective {
        /// Kind of directive the line claimed to be.
        kind: DirectiveKind,
        /// One-based line number within the feature file.
        line_number: usize,
        /// The offending line, verbatim.
        line: String,
    },

    /// The contract server base URL could not be turned into a request URL.
    #[error("invalid contract server URL {url}: {message}")]
    InvalidUrl {
        /// URL that failed to parse.
        url: String,
        /// Parser diagnostic.
        message: String,
    },

    /// Transport-level failure talking to the contract server.
    #[error("request to {url} failed: {source}")]
    Http {
        /// Requested URL.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The contract server answered with an error status.
    #[error("contract server rejected {url} with status {status}")]
    HttpStatus {
        /// Requested URL.
        url: String,
        /// HTTP status code returned by the server.
        status: u16,
    },

    /// The `/expect` body was not a valid expectation report.
    #[error("unreadable expectation report: {0}")]
    ExpectationReport(#[from] serde_json::Error),

    /// The mock server recorded failed expectations.
    #[error("contract expectations failed: {report}")]
    ExpectationsFailed {
        /// Raw report body returned by the server.
        report: String,
    },

    /// A child process could not be started.
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Polling a running child process failed.
    #[error("failed while waiting for `{program}`: {source}")]
    Wait {
        /// Program being awaited.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The step process never accepted connections.
    #[error("step process did not accept connections on {address} within {timeout:?}")]
    StepsNotReady {
        /// Address that was probed.
        address: String,
        /// How long the probe waited.
        timeout: Duration,
    },

    /// Filesystem failure.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being accessed.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
