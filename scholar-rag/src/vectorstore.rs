//! Vector store trait for storing and searching vector embeddings.

use async_trait::async_trait;

use crate::document::SearchResult;
use crate::error::Result;
use crate::index::{DistanceMetric, IndexEntry, MetadataFilter};

/// A storage backend for chunk embeddings with k-nearest-neighbour search.
///
/// A store holds vectors of a single dimension compared with a single
/// [`DistanceMetric`], both fixed when it is created. Implementations must be
/// safe to share between tasks; [`InMemoryVectorStore`](crate::InMemoryVectorStore)
/// is the exact reference. An approximate backend may be substituted behind
/// this trait, but it will not satisfy exact-match tests.
///
/// # Example
///
/// ```rust,ignore
/// use scholar_rag::{InMemoryVectorStore, VectorStore, DistanceMetric};
///
/// let store = InMemoryVectorStore::new(384, DistanceMetric::Euclidean);
/// store.insert_batch(entries).await?;
/// let results = store.search(&query_embedding, 5).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Add one entry. Identical entries may be added more than once.
    async fn insert(&self, entry: IndexEntry) -> Result<()>;

    /// Add several entries; none are added if any is rejected.
    async fn insert_batch(&self, entries: Vec<IndexEntry>) -> Result<()>;

    /// Return the `top_k` entries closest to `embedding`.
    ///
    /// Returns results ordered by ascending distance. An empty store returns
    /// an empty `Vec`.
    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>>;

    /// Return the `top_k` entries closest to `embedding` among those whose
    /// chunk passes `filter`. Filtering happens before truncation.
    async fn search_filtered(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<SearchResult>>;

    /// Number of stored entries.
    async fn len(&self) -> usize;

    /// Remove every entry.
    async fn clear(&self) -> Result<()>;

    /// The vector dimension the store accepts.
    fn dimensions(&self) -> usize;

    /// The distance metric the store ranks by.
    fn metric(&self) -> DistanceMetric;
}
