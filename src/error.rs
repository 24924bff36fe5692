//! Error types for the dialog engine.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the dialog engine and script loader.
#[derive(Debug, Error)]
pub enum DialogError {
    /// A custom action reported a failure. The owning session logs this and
    /// advances past the action on the next tick.
    #[error("dialog action failed: {0}")]
    Action(String),

    /// Requested script id is not present in the registry.
    #[error("dialog script '{0}' not found")]
    UnknownScript(String),

    /// A script file could not be read.
    #[error("failed to read {}", path.display())]
    ScriptIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A script file is not valid TOML.
    #[error("failed to parse {}", path.display())]
    ScriptParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A script parsed but failed validation.
    #[error("invalid dialog script '{id}': {reason}")]
    InvalidScript { id: String, reason: String },
}

impl DialogError {
    /// Shorthand for an action failure with a formatted message.
    pub fn action(msg: impl Into<String>) -> Self {
        DialogError::Action(msg.into())
    }
}
