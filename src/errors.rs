// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

use crate::task::TreeId;

#[derive(Error, Debug)]
pub enum ExplorerError {
    /// A source file could not be tokenized by its format parser.
    #[error("Parse error in {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    /// An external build tool used for task enumeration failed.
    #[error("Tool invocation failed ({program}): {message}")]
    ToolInvocation { program: String, message: String },

    /// Two distinct definitions normalised to the same identity.
    #[error("Identity collision for {0}")]
    IdentityCollision(TreeId),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExplorerError {
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ExplorerError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True for the errors that a synchronization pass recovers from by
    /// keeping the previous state of the file.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ExplorerError::Parse { .. }
                | ExplorerError::ToolInvocation { .. }
                | ExplorerError::JsonError(_)
                | ExplorerError::TomlError(_)
                | ExplorerError::IoError(_)
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ExplorerError>;
