//! Per-scenario report locations.
//!
//! Scenario names are free text and may contain characters that are unsafe
//! in paths, so each report lives under a directory named by the SHA-256 of
//! the scenario name.

use camino::{Utf8Path, Utf8PathBuf};
use sha2::{Digest, Sha256};

/// Hashes a scenario name into a stable, filesystem-safe identifier.
#[must_use]
pub fn scenario_digest(scenario: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(scenario.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Returns the report location for `scenario` under `results_dir`.
#[must_use]
pub fn report_location(results_dir: &Utf8Path, scenario: &str) -> Utf8PathBuf {
    results_dir.join(scenario_digest(scenario))
}
