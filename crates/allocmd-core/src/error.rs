//! error taxonomy for allocmd

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// missing or inconsistent user input
    #[error("{0}")]
    Validation(String),

    /// required external tool absent or daemon not running
    #[error("{0}")]
    DependencyMissing(String),

    #[error("`{command}` failed{}: {stderr}", .code.map(|c| format!(" with exit code {}", c)).unwrap_or_default())]
    Subprocess {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("config error at {}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },

    /// expected pattern not found in external tool output
    #[error("could not parse {0}")]
    Parse(String),

    /// faucet, peer list or ip lookup failed. callers treat this as non-fatal
    #[error("network error: {0}")]
    Network(String),

    #[error("template error: {0}")]
    Template(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn config(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::Config {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// whether the failure may be logged and skipped
    pub fn is_best_effort(&self) -> bool {
        matches!(self, Error::Network(_))
    }
}
