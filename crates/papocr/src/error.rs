use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PapocrError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Logging error: {0}")]
    Logging(#[from] crate::logging::LoggingError),

    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write '{path}': {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Invalid value '{value}' for {field}")]
    InvalidValue { field: String, value: String },

    #[error("Failed to load persisted configuration: {0}")]
    Database(String),
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            value: value.into(),
        }
    }
}

/// The only error a caller of the parser sees.
///
/// Engine failures of every kind collapse into [`ParseError::Ocr`].
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Unsupported mime type: {0}")]
    UnsupportedMimeType(String),

    #[error("Failed to read document '{path}': {source}")]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Cannot produce archive PDF for image '{path}': no DPI information is present \
         in this image and no image DPI is configured"
    )]
    MissingImageDpi { path: PathBuf },

    #[error("Failed to prepare image '{path}': {reason}")]
    ImagePreparation { path: PathBuf, reason: String },

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("Failed to create working directory: {0}")]
    WorkingDirectory(#[source] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, PapocrError>;
