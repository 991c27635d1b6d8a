use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the security controller.
#[derive(Error, Debug)]
pub enum SecurityError {
    /// The sensor store rejected a read or a write.
    #[error("Store failure: {0}")]
    Store(String),

    /// The image classifier could not produce an answer.
    #[error("Classifier failure: {0}")]
    Classifier(String),

    /// A store file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A store file could not be written to disk.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed or produced.
    #[error("Failed to process JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// An arming status string is not one of the recognised values.
    #[error("Invalid arming status: {0}")]
    InvalidArmingStatus(String),

    /// An alarm status string is not one of the recognised values.
    #[error("Invalid alarm status: {0}")]
    InvalidAlarmStatus(String),

    /// A sensor type string is not one of the recognised values.
    #[error("Invalid sensor type: {0}")]
    InvalidSensorType(String),

    /// No sensor with the given name is registered.
    #[error("Sensor not found: {0}")]
    SensorNotFound(String),

    /// A thread panicked while holding one of the engine's locks.
    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the catpoint crates.
pub type Result<T> = std::result::Result<T, SecurityError>;
