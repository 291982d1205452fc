use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeckError {
    #[error("invalid app identity '{0}': segments must not be empty, absolute, or contain path traversal")]
    InvalidIdentity(String),

    #[error("app source not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },

    #[error("app name '{name}' is ambiguous; found in categories: {}", categories.join(", "))]
    AmbiguousApp {
        name: String,
        categories: Vec<String>,
    },

    #[error("unknown phase: {0}")]
    UnknownPhase(String),

    #[error("invalid phase order: {0}")]
    InvalidPhaseOrder(String),

    #[error("phase '{0}' is terminal; cannot advance further")]
    TerminalPhase(String),

    #[error("invalid deploy endpoint '{0}': must be an http(s) URL")]
    InvalidEndpoint(String),

    #[error("failed to build deploy request: {0}")]
    RequestBuild(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DeckError>;
