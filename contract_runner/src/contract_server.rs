//! Client for the external mock/contract server.
//!
//! The server loads a named contract script on `/init` and reports whether
//! the interactions it observed matched that script on `/expect`. Both calls
//! are synchronous and never retried; any failure aborts the run.

use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::RunnerError;

/// Query parameter naming the contract script to load.
pub const CONTRACT_SCRIPT_PARAM: &str = "__contract__script__";

/// Operations the scanner needs from a contract server.
pub trait ContractServer {
    /// Asks the server to load the named contract script.
    ///
    /// # Errors
    ///
    /// Returns a [`RunnerError`] when the request fails or is rejected.
    fn init(&self, contract: &str) -> Result<(), RunnerError>;

    /// Verifies that the server observed exactly the expected interactions.
    ///
    /// # Errors
    ///
    /// Returns a [`RunnerError`] when the request fails, the report cannot
    /// be read, or the report flags failed expectations.
    fn check_expectations(&self) -> Result<(), RunnerError>;
}

/// HTTP implementation of [`ContractServer`].
#[derive(Debug, Clone)]
pub struct HttpContractServer {
    client: Client,
    base_url: String,
}

impl HttpContractServer {
    /// Builds a client for `http://<host>:<port>` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Http`] when the HTTP client cannot be built.
    pub fn new(host: &str, port: u16, timeout: Duration) -> Result<Self, RunnerError> {
        let base_url = format!("http://{host}:{port}");
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| RunnerError::Http {
                url: base_url.clone(),
                source,
            })?;
        Ok(Self { client, base_url })
    }

    /// Returns the base URL requests are issued against.
    #[must_use]
    pub const fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, RunnerError> {
        let raw = format!("{}{path}", self.base_url);
        let parsed = if params.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, params)
        };
        parsed.map_err(|err| RunnerError::InvalidUrl {
            url: raw,
            message: err.to_string(),
        })
    }

    fn get(&self, url: Url) -> Result<Response, RunnerError> {
        debug!(%url, "contacting contract server");
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|source| RunnerError::Http {
                url: url.to_string(),
                source,
            })?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(RunnerError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

impl ContractServer for HttpContractServer {
    fn init(&self, contract: &str) -> Result<(), RunnerError> {
        let url = self.endpoint("/init", &[(CONTRACT_SCRIPT_PARAM, contract)])?;
        self.get(url)?;
        info!(contract, "contract initialised");
        Ok(())
    }

    fn check_expectations(&self) -> Result<(), RunnerError> {
        let url = self.endpoint("/expect", &[])?;
        let body = self
            .get(url.clone())?
            .text()
            .map_err(|source| RunnerError::Http {
                url: url.to_string(),
                source,
            })?;
        evaluate_expectation_report(&body)?;
        info!("contract expectations met");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ExpectationReport {
    expectations: Expectations,
}

#[derive(Debug, Deserialize)]
struct Expectations {
    failed: Value,
}

/// Checks an `/expect` response body.
///
/// The body must be a JSON object carrying `expectations.failed`. Any truthy
/// value there (`true`, a non-empty list of failures, a non-zero count)
/// means the contract was violated.
///
/// # Errors
///
/// Returns [`RunnerError::ExpectationReport`] when the body is not a report
/// and [`RunnerError::ExpectationsFailed`] when it flags failures.
pub fn evaluate_expectation_report(body: &str) -> Result<(), RunnerError> {
    let report: ExpectationReport = serde_json::from_str(body)?;
    if is_truthy(&report.expectations.failed) {
        return Err(RunnerError::ExpectationsFailed {
            report: body.trim().to_owned(),
        });
    }
    Ok(())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_i64() != Some(0) && number.as_u64() != Some(0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}
