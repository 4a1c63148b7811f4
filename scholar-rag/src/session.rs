//! Session-scoped retrieval context.
//!
//! A [`ResearchSession`] owns everything one user interaction indexes: the
//! pipeline, its vector store, and a ledger of indexed documents. Nothing is
//! global and nothing outlives the session; dropping it discards the index.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::config::RagConfig;
use crate::document::{IngestReport, IngestResult, SearchResult, SourceDocument};
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::evidence::{DOC_TYPE_KEY, EvidenceBlock, render_evidence};
use crate::index::{DistanceMetric, MetadataFilter};
use crate::pipeline::RetrievalPipeline;
use crate::vectorstore::VectorStore;

/// A document whose chunks are in the session's index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexedDocument {
    /// The document's filename.
    pub filename: String,
    /// How many chunks it contributed.
    pub chunks: usize,
}

/// A snapshot of what a session has indexed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    /// The session's identifier.
    pub session_id: Uuid,
    /// Whether anything has been indexed.
    pub initialized: bool,
    /// Number of index entries (chunks).
    pub entries: usize,
    /// Number of successfully indexed documents.
    pub documents: usize,
    /// Name of the embedding model.
    pub embedding_model: String,
    /// Embedding dimension.
    pub dimensions: usize,
    /// Distance metric of the index.
    pub metric: DistanceMetric,
}

/// One research session's retrieval state.
///
/// # Example
///
/// ```rust,ignore
/// use scholar_rag::{HashingEmbedder, RagConfig, ResearchSession};
///
/// let session = ResearchSession::new(RagConfig::default(), Arc::new(HashingEmbedder::default()))?;
/// let outcome = session.ingest(bytes, "trial.pdf").await;
/// let results = session.retrieve("primary endpoint", 5).await?;
/// session.reset().await?;
/// ```
pub struct ResearchSession {
    id: Uuid,
    pipeline: RetrievalPipeline,
    documents: RwLock<Vec<IndexedDocument>>,
}

impl ResearchSession {
    /// Start a session with an in-memory index sized for `provider`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`](crate::RagError::ConfigError) if `config` is invalid.
    pub fn new(config: RagConfig, provider: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        let pipeline =
            RetrievalPipeline::builder().config(config).embedding_provider(provider).build()?;
        Ok(Self::from_pipeline(pipeline))
    }

    /// Start a session backed by a custom vector store.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`](crate::RagError::ConfigError) if `config` is invalid or
    /// the store's dimension differs from the provider's.
    pub fn with_store(
        config: RagConfig,
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        let pipeline = RetrievalPipeline::builder()
            .config(config)
            .embedding_provider(provider)
            .vector_store(store)
            .build()?;
        Ok(Self::from_pipeline(pipeline))
    }

    /// Wrap an already-built pipeline.
    pub fn from_pipeline(pipeline: RetrievalPipeline) -> Self {
        let id = Uuid::new_v4();
        let model = pipeline.embedding_provider().model_name();
        info!(session.id = %id, model, "session started");
        Self { id, pipeline, documents: RwLock::new(Vec::new()) }
    }

    /// The session's identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The session's configuration.
    pub fn config(&self) -> &RagConfig {
        self.pipeline.config()
    }

    fn span(&self, operation: &'static str) -> tracing::Span {
        info_span!("research_session", session.id = %self.id, operation)
    }

    fn record(ledger: &mut Vec<IndexedDocument>, outcome: &IngestResult) {
        if outcome.success {
            ledger.push(IndexedDocument {
                filename: outcome.filename.clone(),
                chunks: outcome.chunks_indexed,
            });
        }
    }

    /// Index one uploaded file.
    ///
    /// Never returns an error; extraction and embedding problems are reported
    /// in the [`IngestResult`].
    pub async fn ingest(&self, content: Vec<u8>, filename: impl Into<String>) -> IngestResult {
        self.ingest_document(SourceDocument::new(filename, content)).await
    }

    /// Index one document, keeping its metadata on every chunk.
    pub async fn ingest_document(&self, document: SourceDocument) -> IngestResult {
        async {
            let mut ledger = self.documents.write().await;
            let outcome = self.pipeline.ingest(document).await;
            Self::record(&mut ledger, &outcome);
            outcome
        }
        .instrument(self.span("ingest"))
        .await
    }

    /// Index several documents; one failure does not stop the others.
    pub async fn ingest_all(&self, documents: Vec<SourceDocument>) -> IngestReport {
        async {
            let mut ledger = self.documents.write().await;
            let report = self.pipeline.ingest_batch(documents).await;
            for outcome in &report.outcomes {
                Self::record(&mut ledger, outcome);
            }
            report
        }
        .instrument(self.span("ingest_all"))
        .await
    }

    /// Return the `k` indexed chunks closest to `query`, closest first.
    ///
    /// A blank query or an empty session returns an empty `Vec`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`](crate::RagError::ConfigError) if `k` is zero and
    /// propagates embedding failures.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        self.pipeline.query(query, k).instrument(self.span("retrieve")).await
    }

    /// Like [`retrieve`](Self::retrieve), restricted to chunks whose
    /// document type (metadata key [`DOC_TYPE_KEY`]) is in `doc_types`.
    ///
    /// An empty set selects every chunk. Chunks of documents uploaded without
    /// a type are excluded by a non-empty set.
    pub async fn retrieve_filtered(
        &self,
        query: &str,
        k: usize,
        doc_types: &HashSet<String>,
    ) -> Result<Vec<SearchResult>> {
        if doc_types.is_empty() {
            return self.retrieve(query, k).await;
        }
        let filter = MetadataFilter::new(DOC_TYPE_KEY, doc_types.iter().cloned());
        self.pipeline.query_filtered(query, k, &filter).instrument(self.span("retrieve")).await
    }

    /// [`retrieve`](Self::retrieve) with the configured `top_k`.
    pub async fn retrieve_default(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.retrieve(query, self.config().top_k).await
    }

    /// Retrieve with the configured `top_k` and render the results as an
    /// evidence block bounded by `max_context_chars`.
    pub async fn evidence(&self, query: &str) -> Result<EvidenceBlock> {
        let results = self.retrieve_default(query).await?;
        Ok(render_evidence(&results, self.config().max_context_chars))
    }

    /// Discard every indexed chunk and document.
    pub async fn reset(&self) -> Result<()> {
        async {
            let mut ledger = self.documents.write().await;
            self.pipeline.vector_store().clear().await?;
            let dropped = ledger.len();
            ledger.clear();
            info!(documents = dropped, "session reset");
            Ok(())
        }
        .instrument(self.span("reset"))
        .await
    }

    /// The documents indexed so far, in ingestion order.
    pub async fn documents(&self) -> Vec<IndexedDocument> {
        self.documents.read().await.clone()
    }

    /// Summarise the session's index.
    pub async fn status(&self) -> SessionStatus {
        let documents = self.documents.read().await.len();
        let store = self.pipeline.vector_store();
        let entries = store.len().await;
        let provider = self.pipeline.embedding_provider();
        SessionStatus {
            session_id: self.id,
            initialized: entries > 0,
            entries,
            documents,
            embedding_model: provider.model_name().to_string(),
            dimensions: store.dimensions(),
            metric: store.metric(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::HashingEmbedder;

    fn session() -> ResearchSession {
        let config =
            RagConfig::builder().chunk_size(80).chunk_overlap(10).top_k(3).build().expect("config");
        ResearchSession::new(config, Arc::new(HashingEmbedder::new(64))).expect("session")
    }

    #[tokio::test]
    async fn ingest_records_successful_documents_only() {
        let session = session();
        let ok = session.ingest(b"Statins lower LDL cholesterol.".to_vec(), "statins.txt").await;
        let bad = session.ingest(vec![0xff, 0xfe, 0x00], "broken.txt").await;

        assert!(ok.success);
        assert!(!bad.success);
        let documents = session.documents().await;
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].filename, "statins.txt");
        assert_eq!(documents[0].chunks, ok.chunks_indexed);
    }

    #[tokio::test]
    async fn reset_empties_the_session() {
        let session = session();
        session.ingest(b"Aspirin reduces platelet aggregation.".to_vec(), "aspirin.txt").await;
        assert!(session.status().await.initialized);

        session.reset().await.expect("reset");

        let status = session.status().await;
        assert!(!status.initialized);
        assert_eq!(status.entries, 0);
        assert_eq!(status.documents, 0);
        assert!(session.retrieve("aspirin", 3).await.expect("retrieve").is_empty());
    }

    #[tokio::test]
    async fn status_describes_the_index() {
        let session = session();
        let status = session.status().await;
        assert_eq!(status.session_id, session.id());
        assert_eq!(status.dimensions, 64);
        assert_eq!(status.embedding_model, "feature-hash-64");
        assert_eq!(status.metric, DistanceMetric::Euclidean);
    }

    #[tokio::test]
    async fn evidence_uses_configured_top_k() {
        let session = session();
        let text = "Metformin is first-line therapy for type 2 diabetes. ".repeat(10);
        session.ingest(text.into_bytes(), "metformin.txt").await;

        let block = session.evidence("metformin diabetes").await.expect("evidence");
        assert_eq!(block.included, 3);
        assert!(block.text.starts_with("--- Document Source 1 ---"));
    }

    #[tokio::test]
    async fn sessions_do_not_share_state() {
        let first = session();
        let second = session();
        first.ingest(b"Beta blockers slow heart rate.".to_vec(), "beta.txt").await;

        assert_ne!(first.id(), second.id());
        assert_eq!(second.status().await.entries, 0);
    }
}
