use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid server origin: {0}")]
    InvalidOrigin(String),

    #[error("Connection error: {0}")]
    Connect(String),

    #[error("Connection timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("Connection attempt abandoned by disconnect")]
    Cancelled,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed message: {0}")]
    Malformed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not connected to the battle server")]
    NotConnected,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Error type returned by event handlers. Logged, never propagated.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;
