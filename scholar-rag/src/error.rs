//! Error types for the `scholar-rag` crate.

use thiserror::Error;

/// Errors that can occur while ingesting or retrieving documents.
#[derive(Debug, Error)]
pub enum RagError {
    /// A document could not be turned into text (corrupted, encrypted,
    /// unsupported, or image-only).
    #[error("Extraction failed for '{document}': {message}")]
    ExtractionFailure {
        /// The filename of the document that failed.
        document: String,
        /// A description of the failure.
        message: String,
    },

    /// The embedding model is not loaded or cannot be reached.
    #[error("Embedding model unavailable ({provider}): {message}")]
    EmbeddingUnavailable {
        /// The embedding provider that is unavailable.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A vector's length disagrees with the index dimension.
    #[error("Dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch {
        /// The dimension fixed at index construction.
        expected: usize,
        /// The dimension of the offending vector.
        actual: usize,
    },

    /// An error occurred during document chunking.
    #[error("Chunking error: {0}")]
    ChunkingError(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An I/O error, e.g. while reading a configuration file.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A JSON (de)serialisation error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;
