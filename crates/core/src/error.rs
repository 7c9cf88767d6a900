use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type used across the entire client.
#[derive(Debug, Error)]
pub enum GardenError {
    #[error("config error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("unexpected response: {0}")]
    Protocol(String),

    #[error("action disabled for plant '{0}'")]
    ActionDisabled(String),

    #[error("no plant named '{0}' on this page")]
    UnknownPlant(String),

    #[error("cannot read '{}': {source}", .path.display())]
    Io {
        path:   PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T, E = GardenError> = std::result::Result<T, E>;
