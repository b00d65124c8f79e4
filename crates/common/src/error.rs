//! Error types shared across Cutline crates.

use std::path::PathBuf;

/// Top-level error type for the collaborator-facing surface
/// (configuration and script loading). The playback core itself is total.
#[derive(Debug, thiserror::Error)]
pub enum CutlineError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Script error: {message}")]
    Script { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using CutlineError.
pub type CutlineResult<T> = Result<T, CutlineError>;

impl CutlineError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn script(msg: impl Into<String>) -> Self {
        Self::Script {
            message: msg.into(),
        }
    }
}
