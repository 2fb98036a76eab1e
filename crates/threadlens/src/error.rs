//! Error types for threadlens

use thiserror::Error;

use crate::analyzer::AnalyzeError;

/// Main error type for daemon startup and the one-shot CLI path
#[derive(Error, Debug)]
pub enum ThreadlensError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("Server error: {0}")]
    Server(String),

    /// Page extraction errors
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Analysis pipeline errors
    #[error("Analysis failed: {0}")]
    Analyze(#[from] AnalyzeError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for threadlens operations
pub type Result<T> = std::result::Result<T, ThreadlensError>;
