//! In-memory vector store backed by a [`FlatIndex`].
//!
//! This module provides [`InMemoryVectorStore`], a brute-force store whose
//! single `tokio::sync::RwLock` guards every insert, search and clear. It is
//! sized for one research session's uploads and is dropped with the session.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::document::SearchResult;
use crate::error::Result;
use crate::index::{DistanceMetric, FlatIndex, IndexEntry, MetadataFilter};
use crate::vectorstore::VectorStore;

/// An exact in-memory vector store.
///
/// # Example
///
/// ```rust,ignore
/// use scholar_rag::{DistanceMetric, InMemoryVectorStore};
///
/// let store = InMemoryVectorStore::new(384, DistanceMetric::Euclidean);
/// ```
#[derive(Debug)]
pub struct InMemoryVectorStore {
    dimensions: usize,
    metric: DistanceMetric,
    index: RwLock<FlatIndex>,
}

impl InMemoryVectorStore {
    /// Create an empty store for `dimensions`-long vectors.
    pub fn new(dimensions: usize, metric: DistanceMetric) -> Self {
        Self { dimensions, metric, index: RwLock::new(FlatIndex::new(dimensions, metric)) }
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn insert(&self, entry: IndexEntry) -> Result<()> {
        let mut index = self.index.write().await;
        index.insert(entry.vector, entry.chunk)
    }

    async fn insert_batch(&self, entries: Vec<IndexEntry>) -> Result<()> {
        let count = entries.len();
        let mut index = self.index.write().await;
        index.insert_batch(entries)?;
        debug!(count, total = index.len(), "inserted entries");
        Ok(())
    }

    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        let index = self.index.read().await;
        index.query(embedding, top_k)
    }

    async fn search_filtered(
        &self,
        embedding: &[f32],
        top_k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<SearchResult>> {
        let index = self.index.read().await;
        index.query_filtered(embedding, top_k, filter)
    }

    async fn len(&self) -> usize {
        self.index.read().await.len()
    }

    async fn clear(&self) -> Result<()> {
        self.index.write().await.clear();
        Ok(())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn metric(&self) -> DistanceMetric {
        self.metric
    }
}
