//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;
use tracing::debug;

use crate::error::{RagError, Result};

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding models behind a unified async
/// interface. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// implementation calls [`embed`](EmbeddingProvider::embed) sequentially;
/// backends that support native batching should override it, and must return
/// the same vector for a text whether it is embedded alone or in a batch.
///
/// When the underlying model cannot be loaded, implementations return
/// [`RagError::EmbeddingUnavailable`].
///
/// # Example
///
/// ```rust,ignore
/// use scholar_rag::EmbeddingProvider;
///
/// let provider = HashingEmbedder::default();
/// let embedding = provider.embed("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// The default implementation calls [`embed`](EmbeddingProvider::embed)
    /// sequentially for each input.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// A short name for the model, reported in session status and logs.
    fn model_name(&self) -> &str;
}

/// Embed `texts` in batches of at most `batch_size`, preserving order.
///
/// # Errors
///
/// Propagates provider errors unchanged, and returns
/// [`RagError::EmbeddingError`] if a batch comes back with the wrong number of
/// vectors.
pub async fn embed_in_batches(
    provider: &dyn EmbeddingProvider,
    texts: &[&str],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>> {
    let batch_size = batch_size.max(1);
    let mut embeddings = Vec::with_capacity(texts.len());

    for (batch_index, batch) in texts.chunks(batch_size).enumerate() {
        let vectors = provider.embed_batch(batch).await?;
        if vectors.len() != batch.len() {
            return Err(RagError::EmbeddingError {
                provider: provider.model_name().to_string(),
                message: format!(
                    "expected {} embeddings in batch {batch_index}, got {}",
                    batch.len(),
                    vectors.len()
                ),
            });
        }
        debug!(batch_index, batch_len = batch.len(), "embedded batch");
        embeddings.extend(vectors);
    }

    Ok(embeddings)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ShortBatchProvider;

    #[async_trait]
    impl EmbeddingProvider for ShortBatchProvider {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.0; 2])
        }

        async fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![0.0; 2]])
        }

        fn dimensions(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "short-batch"
        }
    }

    struct LengthProvider;

    #[async_trait]
    impl EmbeddingProvider for LengthProvider {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.len() as f32])
        }

        fn dimensions(&self) -> usize {
            1
        }

        fn model_name(&self) -> &str {
            "length"
        }
    }

    #[tokio::test]
    async fn batches_preserve_input_order() {
        let texts = ["a", "bb", "ccc", "dddd", "eeeee"];
        let vectors = embed_in_batches(&LengthProvider, &texts, 2).await.unwrap();
        let flat: Vec<f32> = vectors.into_iter().flatten().collect();
        assert_eq!(flat, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[tokio::test]
    async fn short_batches_are_reported() {
        let err = embed_in_batches(&ShortBatchProvider, &["a", "b"], 8).await.unwrap_err();
        assert!(matches!(err, RagError::EmbeddingError { provider, .. } if provider == "short-batch"));
    }
}
