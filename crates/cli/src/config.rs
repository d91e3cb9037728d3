//! Configuration file for `bnfkit --config <file>`.
//!
//! # Example
//!
//! ```toml
//! output = "json"
//! quiet = false
//!
//! [parse]
//! max_depth = 128
//! timeout_ms = 500
//!
//! [log]
//! level = "bnfkit_core=debug"
//! ```
//!
//! Every key is optional. Command-line flags override the file.

use std::path::Path;

use serde::Deserialize;

use crate::OutputFormat;

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    pub output: Option<OutputFormat>,
    pub quiet: Option<bool>,
    #[serde(default)]
    pub parse: ParseSettings,
    #[serde(default)]
    pub log: LogSettings,
}

/// `[parse]` section: limits applied to every parse.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ParseSettings {
    /// Maximum rule nesting depth.
    pub max_depth: Option<usize>,
    /// Wall-clock budget per parse, in milliseconds.
    pub timeout_ms: Option<u64>,
}

/// `[log]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LogSettings {
    /// A `tracing` filter directive.
    pub level: Option<String>,
}

// ── Functions ─────────────────────────────────────────────────────────────────

/// Read and parse a config TOML file from `path`.
///
/// Returns a human-readable error string on failure.
pub(crate) fn read_config(path: &Path) -> Result<Config, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;

    toml::from_str(&content).map_err(|e| format!("could not parse '{}': {}", path.display(), e))
}
