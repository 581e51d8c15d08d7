// ABOUTME: Parses environment tool stdout into a set/unset diff
// ABOUTME: Supports direnv's JSON export and NUL-delimited NAME=VALUE records

use direnvoy_logging::trace;
use std::collections::HashMap;

use crate::config::ExportFormat;
use crate::error::ImportError;

/// Variable changes produced by one tool invocation.
///
/// Names are unique across the whole diff: a later record for a name
/// supersedes an earlier one, whether it sets or unsets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvDiff {
    set: HashMap<String, String>,
    unset: Vec<String>,
}

impl EnvDiff {
    pub fn record_set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.unset.retain(|n| n != &name);
        self.set.insert(name, value.into());
    }

    pub fn record_unset(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.set.remove(&name);
        if !self.unset.contains(&name) {
            self.unset.push(name);
        }
    }

    pub fn set(&self) -> &HashMap<String, String> {
        &self.set
    }

    pub fn unset(&self) -> &[String] {
        &self.unset
    }

    pub fn len(&self) -> usize {
        self.set.len() + self.unset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty()
    }
}

/// Converts raw tool stdout into an [`EnvDiff`].
///
/// Malformed records are skipped; a parse error is returned only for
/// fundamentally malformed input such as broken JSON or invalid UTF-8.
/// Empty output is a valid empty diff: direnv prints nothing when the
/// environment is already up to date.
#[derive(Debug, Clone, Copy)]
pub struct OutputParser {
    format: ExportFormat,
}

impl OutputParser {
    pub fn new(format: ExportFormat) -> Self {
        Self { format }
    }

    pub fn parse(&self, stdout: &[u8]) -> Result<EnvDiff, ImportError> {
        match self.format {
            ExportFormat::Json => parse_json(stdout),
            ExportFormat::NulDelimited => parse_nul_delimited(stdout),
        }
    }
}

/// Parse direnv's `export json` output: an object of name to string or null,
/// where null retracts the variable.
fn parse_json(stdout: &[u8]) -> Result<EnvDiff, ImportError> {
    let mut diff = EnvDiff::default();

    let trimmed = stdout.trim_ascii();
    if trimmed.is_empty() {
        return Ok(diff);
    }

    let value: serde_json::Value =
        serde_json::from_slice(trimmed).map_err(|err| ImportError::Parse {
            message: err.to_string(),
        })?;

    let object = value.as_object().ok_or_else(|| ImportError::Parse {
        message: "expected a JSON object of variable assignments".to_string(),
    })?;

    for (name, value) in object {
        match value {
            serde_json::Value::String(s) => diff.record_set(name.as_str(), s.as_str()),
            serde_json::Value::Null => diff.record_unset(name.as_str()),
            other => {
                // The tool only ever emits strings and nulls; anything else
                // is skipped rather than failing the whole import.
                trace!(name = %name, value = %other, "skipping non-string assignment");
            }
        }
    }

    Ok(diff)
}

/// Parse NUL-separated NAME=VALUE records.
fn parse_nul_delimited(stdout: &[u8]) -> Result<EnvDiff, ImportError> {
    let text = std::str::from_utf8(stdout).map_err(|err| ImportError::Parse {
        message: format!("output is not valid UTF-8: {err}"),
    })?;

    let mut diff = EnvDiff::default();
    for record in text.split('\0') {
        if record.is_empty() {
            continue;
        }
        match record.split_once('=') {
            Some((name, value)) if !name.is_empty() => diff.record_set(name, value),
            _ => trace!(record = %record, "skipping malformed record"),
        }
    }

    Ok(diff)
}
