//! Recognition of the two directive markers understood by the scanner.
//!
//! Matching is by substring, not by Gherkin grammar. Names are split on the
//! first delimiter only, so a name that itself contains the delimiter is
//! rejected as malformed rather than silently truncated.

use std::fmt;

use crate::error::RunnerError;

/// Marker introducing a contract tag, for example `@contract=payments_ok`.
pub const CONTRACT_MARKER: &str = "@contract=";

/// Marker introducing a scenario, for example `Scenario: user pays`.
pub const SCENARIO_MARKER: &str = "Scenario:";

/// The kinds of directive a line may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    /// A `@contract=<name>` tag.
    Contract,
    /// A `Scenario: <name>` line.
    Scenario,
}

impl DirectiveKind {
    /// Returns the lowercase label used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Contract => "contract",
            Self::Scenario => "scenario",
        }
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extracts the contract name when `line` carries the contract marker.
///
/// `line_number` is one-based and only used for diagnostics.
///
/// # Errors
///
/// Returns [`RunnerError::MalformedDirective`] when the marker is present but
/// no usable name follows it.
pub fn contract_directive(line: &str, line_number: usize) -> Result<Option<&str>, RunnerError> {
    directive(line, line_number, DirectiveKind::Contract)
}

/// Extracts the scenario name when `line` carries the scenario marker.
///
/// # Errors
///
/// Returns [`RunnerError::MalformedDirective`] when the marker is present but
/// no usable name follows it.
pub fn scenario_directive(line: &str, line_number: usize) -> Result<Option<&str>, RunnerError> {
    directive(line, line_number, DirectiveKind::Scenario)
}

fn directive(
    line: &str,
    line_number: usize,
    kind: DirectiveKind,
) -> Result<Option<&str>, RunnerError> {
    let (marker, extract): (&str, fn(&str) -> Option<&str>) = match kind {
        DirectiveKind::Contract => (CONTRACT_MARKER, contract_name),
        DirectiveKind::Scenario => (SCENARIO_MARKER, scenario_name),
    };
    line.split_once(marker)
        .map(|(_, rest)| {
            extract(rest).ok_or_else(|| RunnerError::MalformedDirective {
                kind,
                line_number,
                line: line.to_owned(),
            })
        })
        .transpose()
}

/// The contract name runs from the marker to the next whitespace.
fn contract_name(rest: &str) -> Option<&str> {
    let name = rest.split(char::is_whitespace).next()?;
    (!name.is_empty() && !name.contains('=')).then_some(name)
}

fn scenario_name(rest: &str) -> Option<&str> {
    let name = rest.trim();
    (!name.is_empty() && !name.contains(':')).then_some(name)
}
