//! Error handling for the candidate ranker

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CandidateRankerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector index error: {0}")]
    Index(String),

    #[error("Scoring error: {0}")]
    Scoring(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, CandidateRankerError>;

/// Convert anyhow errors to our custom error type
impl From<anyhow::Error> for CandidateRankerError {
    fn from(err: anyhow::Error) -> Self {
        CandidateRankerError::Embedding(err.to_string())
    }
}
