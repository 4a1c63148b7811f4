//! Configuration for the retrieval pipeline.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chunking::ChunkingStrategy;
use crate::error::{RagError, Result};
use crate::index::DistanceMetric;

/// Configuration parameters for the retrieval pipeline.
///
/// Every field has a default, so a partial JSON document is enough to
/// override a single knob. Use [`RagConfig::builder()`] in code; it validates
/// eagerly and never hands out an inconsistent config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of top results returned by default from vector search.
    pub top_k: usize,
    /// How document text is split into chunks.
    pub chunking: ChunkingStrategy,
    /// Distance metric used by the session's index.
    pub metric: DistanceMetric,
    /// Maximum number of chunk texts sent to the embedder in one call.
    pub embed_batch_size: usize,
    /// Maximum number of documents processed at once during batch ingestion.
    pub ingest_concurrency: usize,
    /// Upper bound on the rendered evidence block, in characters.
    pub max_context_chars: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 150,
            top_k: 5,
            chunking: ChunkingStrategy::SlidingWindow,
            metric: DistanceMetric::Euclidean,
            embed_batch_size: 32,
            ingest_concurrency: 4,
            max_context_chars: 32_000,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `embed_batch_size`, `ingest_concurrency` or `max_context_chars` is zero
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if self.embed_batch_size == 0 {
            return Err(RagError::ConfigError(
                "embed_batch_size must be greater than zero".to_string(),
            ));
        }
        if self.ingest_concurrency == 0 {
            return Err(RagError::ConfigError(
                "ingest_concurrency must be greater than zero".to_string(),
            ));
        }
        if self.max_context_chars == 0 {
            return Err(RagError::ConfigError(
                "max_context_chars must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse a JSON configuration and validate it.
    ///
    /// Fields missing from the JSON keep their default values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: RagConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of top results to return from vector search.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the chunking strategy.
    pub fn chunking(mut self, strategy: ChunkingStrategy) -> Self {
        self.config.chunking = strategy;
        self
    }

    /// Set the distance metric for the index.
    pub fn metric(mut self, metric: DistanceMetric) -> Self {
        self.config.metric = metric;
        self
    }

    /// Set the maximum number of texts per embedding call.
    pub fn embed_batch_size(mut self, size: usize) -> Self {
        self.config.embed_batch_size = size;
        self
    }

    /// Set how many documents may be processed concurrently.
    pub fn ingest_concurrency(mut self, concurrency: usize) -> Self {
        self.config.ingest_concurrency = concurrency;
        self
    }

    /// Set the maximum size of the rendered evidence block.
    pub fn max_context_chars(mut self, chars: usize) -> Self {
        self.config.max_context_chars = chars;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] as described on [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
