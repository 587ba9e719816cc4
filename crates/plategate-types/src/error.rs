//! Error types for plategate

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration not found")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),

    #[error("Invalid configuration value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Allow-list loading errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Allow-list source not found: {0}")]
    SourceMissing(PathBuf),

    #[error("Malformed allow-list source: {0}")]
    MalformedSource(String),

    #[error("Failed to read allow-list: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse allow-list CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Still-frame capture errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    #[error("Camera unavailable: {0}")]
    Unavailable(String),

    #[error("Frame capture failed: {0}")]
    CaptureFailed(String),
}

/// Why a capture attempt did not yield a plate string.
///
/// These are routine outcomes of a scan, carried inside
/// `RecognitionResult::NotRecognized` rather than raised.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RecognitionFailure {
    #[error("No plate detected in frame")]
    NoPlateDetected,

    #[error("Recognizer returned no text")]
    EmptyText,

    #[error("Recognizer error: {0}")]
    RecognizerError(String),
}

/// GPIO / actuation path errors
#[derive(Debug, Error)]
pub enum HardwareError {
    #[error("GPIO pin {pin} fault: {reason}")]
    Fault { pin: u32, reason: String },

    #[error("GPIO I/O error on pin {pin}: {source}")]
    Io {
        pin: u32,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Allow-list error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
