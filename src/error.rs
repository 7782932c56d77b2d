//! Error handling for the job matcher

use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobMatcherError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Embedding provider error: {0}")]
    Embedding(String),

    #[error("Embedding provider timed out after {0} ms")]
    EmbeddingTimeout(u64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Processing error: {0}")]
    Processing(String),
}

pub type Result<T> = std::result::Result<T, JobMatcherError>;

/// Pattern tables are compiled at construction; a bad pattern is a processing error
impl From<regex::Error> for JobMatcherError {
    fn from(err: regex::Error) -> Self {
        JobMatcherError::Processing(format!("Invalid pattern: {}", err))
    }
}
