//! CLI command implementations for Holdfast.

pub(crate) mod autoplay;
pub(crate) mod balance;
pub(crate) mod replay;

use clap::ValueEnum;
use holdfast::{ActionError, Config, LogError};
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

/// Output format for the `balance` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum BalanceFormat {
    /// Pretty-printed JSON.
    Json,
    /// Wire layout as hex bytes.
    Wire,
}

/// Output format for the `autoplay` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(format!("invalid JSON: {e}"))
    }
}

impl From<LogError> for CliError {
    fn from(e: LogError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<ActionError> for CliError {
    fn from(e: ActionError) -> Self {
        Self::new(e.to_string())
    }
}

/// Read a raw JSON configuration. The result is not balanced yet.
fn read_config(path: &Path) -> Result<Config, CliError> {
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::new(format!("Failed to read {}: {e}", path.display())))?;
    Ok(serde_json::from_str(&text)?)
}
