//! Local sentence-embedding models via `fastembed`.
//!
//! This module is only available when the `fastembed` feature is enabled.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

const PROVIDER: &str = "fastembed";

/// The pretrained models this provider knows the output size of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceModel {
    /// `sentence-transformers/all-MiniLM-L6-v2`, 384 dimensions.
    AllMiniLmL6V2,
    /// `BAAI/bge-small-en-v1.5`, 384 dimensions.
    BgeSmallEnV15,
    /// `BAAI/bge-base-en-v1.5`, 768 dimensions.
    BgeBaseEnV15,
}

impl SentenceModel {
    /// Output dimensionality of the model.
    pub fn dimensions(self) -> usize {
        match self {
            SentenceModel::AllMiniLmL6V2 | SentenceModel::BgeSmallEnV15 => 384,
            SentenceModel::BgeBaseEnV15 => 768,
        }
    }

    /// The model's published name.
    pub fn name(self) -> &'static str {
        match self {
            SentenceModel::AllMiniLmL6V2 => "all-MiniLM-L6-v2",
            SentenceModel::BgeSmallEnV15 => "bge-small-en-v1.5",
            SentenceModel::BgeBaseEnV15 => "bge-base-en-v1.5",
        }
    }

    fn as_fastembed(self) -> EmbeddingModel {
        match self {
            SentenceModel::AllMiniLmL6V2 => EmbeddingModel::AllMiniLML6V2,
            SentenceModel::BgeSmallEnV15 => EmbeddingModel::BGESmallENV15,
            SentenceModel::BgeBaseEnV15 => EmbeddingModel::BGEBaseENV15,
        }
    }
}

/// An [`EmbeddingProvider`] running a pretrained model on the CPU.
///
/// The model is loaded on first use, on the blocking thread pool. If loading
/// fails (no network for the first download, corrupt cache), every call
/// returns [`RagError::EmbeddingUnavailable`] and the next call tries again.
///
/// Texts embedded together are padded to a common length; attention masking
/// keeps each text's pooled vector independent of its batch neighbours.
///
/// # Example
///
/// ```rust,ignore
/// use scholar_rag::fastembed_provider::{FastEmbedProvider, SentenceModel};
///
/// let provider = FastEmbedProvider::new(SentenceModel::AllMiniLmL6V2);
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct FastEmbedProvider {
    model: SentenceModel,
    cache_dir: PathBuf,
    loaded: OnceCell<Arc<TextEmbedding>>,
}

impl FastEmbedProvider {
    /// Create a provider for `model`. Nothing is loaded until the first call.
    ///
    /// Models are cached in `FASTEMBED_CACHE_PATH`, `~/.cache/fastembed`, or
    /// `.fastembed_cache`, in that order of preference.
    pub fn new(model: SentenceModel) -> Self {
        let cache_dir = resolve_cache_dir(
            std::env::var("FASTEMBED_CACHE_PATH").ok(),
            std::env::var("HOME").ok(),
        );
        Self { model, cache_dir, loaded: OnceCell::new() }
    }

    /// The directory models are cached in.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Override the model cache directory.
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    /// Whether the model has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }

    async fn model(&self) -> Result<Arc<TextEmbedding>> {
        let handle = self
            .loaded
            .get_or_try_init(|| async {
                let model = self.model;
                let cache_dir = self.cache_dir.clone();
                let loaded = tokio::task::spawn_blocking(move || {
                    TextEmbedding::try_new(
                        InitOptions::new(model.as_fastembed())
                            .with_cache_dir(cache_dir)
                            .with_show_download_progress(false),
                    )
                })
                .await
                .map_err(|e| unavailable(format!("model loader task failed: {e}")))?
                .map_err(|e| unavailable(format!("failed to load {}: {e}", model.name())))?;
                info!(model = model.name(), "loaded embedding model");
                Ok::<_, RagError>(Arc::new(loaded))
            })
            .await
            .inspect_err(|e| error!(error = %e, "embedding model unavailable"))?;
        Ok(Arc::clone(handle))
    }
}

fn resolve_cache_dir(explicit: Option<String>, home: Option<String>) -> PathBuf {
    match (explicit, home) {
        (Some(path), _) => PathBuf::from(path),
        (None, Some(home)) => Path::new(&home).join(".cache").join("fastembed"),
        (None, None) => PathBuf::from(".fastembed_cache"),
    }
}

fn unavailable(message: String) -> RagError {
    RagError::EmbeddingUnavailable { provider: PROVIDER.to_string(), message }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text]).await?;
        vectors.pop().ok_or_else(|| RagError::EmbeddingError {
            provider: PROVIDER.to_string(),
            message: "model returned no embedding".to_string(),
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let model = self.model().await?;
        let owned: Vec<String> = texts.iter().map(|text| text.to_string()).collect();
        let batch_size = owned.len();

        tokio::task::spawn_blocking(move || model.embed(owned, Some(batch_size)))
            .await
            .map_err(|e| RagError::EmbeddingError {
                provider: PROVIDER.to_string(),
                message: format!("inference task failed: {e}"),
            })?
            .map_err(|e| RagError::EmbeddingError {
                provider: PROVIDER.to_string(),
                message: e.to_string(),
            })
    }

    fn dimensions(&self) -> usize {
        self.model.dimensions()
    }

    fn model_name(&self) -> &str {
        self.model.name()
    }
}
