//! Retrieval pipeline orchestrator.
//!
//! The [`RetrievalPipeline`] coordinates ingestion (extract → chunk → embed →
//! store) and query execution (embed → search) by composing an
//! [`ExtractorRegistry`], a [`Chunker`], an [`EmbeddingProvider`] and a
//! [`VectorStore`].
//!
//! Ingestion never fails as a whole: every per-document problem is turned
//! into a failed [`IngestResult`] so one corrupt upload cannot stop the rest.
//!
//! # Example
//!
//! ```rust,ignore
//! use scholar_rag::{HashingEmbedder, RagConfig, RetrievalPipeline, SourceDocument};
//!
//! let pipeline = RetrievalPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(HashingEmbedder::default()))
//!     .build()?;
//!
//! let outcome = pipeline.ingest(SourceDocument::new("notes.txt", bytes)).await;
//! let results = pipeline.query("search query", 5).await?;
//! ```

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};

use crate::chunking::Chunker;
use crate::config::RagConfig;
use crate::document::{IngestReport, IngestResult, SearchResult, SourceDocument};
use crate::embedding::{EmbeddingProvider, embed_in_batches};
use crate::error::{RagError, Result};
use crate::extract::ExtractorRegistry;
use crate::index::{IndexEntry, MetadataFilter};
use crate::inmemory::InMemoryVectorStore;
use crate::vectorstore::VectorStore;

/// A document that made it through extraction, chunking and embedding.
struct PreparedDocument {
    filename: String,
    entries: Vec<IndexEntry>,
    warnings: Vec<String>,
}

/// A document that failed before reaching the store.
struct FailedDocument {
    filename: String,
    error: RagError,
    warnings: Vec<String>,
}

type Prepared = std::result::Result<PreparedDocument, FailedDocument>;

/// The retrieval pipeline orchestrator.
///
/// Construct one via [`RetrievalPipeline::builder()`].
pub struct RetrievalPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
    extractors: ExtractorRegistry,
}

impl RetrievalPipeline {
    /// Create a new [`RetrievalPipelineBuilder`].
    pub fn builder() -> RetrievalPipelineBuilder {
        RetrievalPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Extract, chunk and embed one document without touching the store.
    async fn prepare(&self, document: SourceDocument) -> Prepared {
        let filename = document.filename.clone();
        let metadata = document.metadata.clone();
        let fail = |error: RagError, warnings: Vec<String>| FailedDocument {
            filename: filename.clone(),
            error,
            warnings,
        };

        // 1. Extract page texts on the blocking pool; PDF parsing is CPU-bound.
        let extractors = self.extractors.clone();
        let extraction = tokio::task::spawn_blocking(move || extractors.extract(&document)).await;
        let extracted = match extraction {
            Ok(Ok(extracted)) => extracted,
            Ok(Err(e)) => return Err(fail(e, Vec::new())),
            Err(e) => {
                let error = RagError::ExtractionFailure {
                    document: filename.clone(),
                    message: format!("extraction task failed: {e}"),
                };
                return Err(fail(error, Vec::new()));
            }
        };

        if extracted.is_blank() {
            let error = RagError::ExtractionFailure {
                document: filename.clone(),
                message: "no extractable text".to_string(),
            };
            return Err(fail(error, extracted.warnings));
        }

        // 2. Chunk the concatenated pages
        let chunks = self.chunker.chunk(&filename, &extracted.text(), &metadata);
        debug!(
            document.id = %filename,
            pages = extracted.pages.len(),
            chunk_count = chunks.len(),
            "chunked document"
        );

        // 3. Embed chunk texts in batches
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = match embed_in_batches(
            self.embedding_provider.as_ref(),
            &texts,
            self.config.embed_batch_size,
        )
        .await
        {
            Ok(embeddings) => embeddings,
            Err(e) => {
                error!(document.id = %filename, error = %e, "embedding failed during ingestion");
                return Err(fail(e, extracted.warnings));
            }
        };

        // 4. Pair vectors with their chunks
        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, vector)| IndexEntry { vector, chunk })
            .collect();

        Ok(PreparedDocument { filename, entries, warnings: extracted.warnings })
    }

    /// Insert a prepared document into the store and build its outcome.
    async fn commit(&self, prepared: Prepared) -> IngestResult {
        let failed = match prepared {
            Ok(document) => {
                let chunk_count = document.entries.len();
                match self.vector_store.insert_batch(document.entries).await {
                    Ok(()) => {
                        info!(document.id = %document.filename, chunk_count, "ingested document");
                        return IngestResult::indexed(
                            &document.filename,
                            chunk_count,
                            document.warnings,
                        );
                    }
                    Err(e) => FailedDocument {
                        filename: document.filename,
                        error: e,
                        warnings: document.warnings,
                    },
                }
            }
            Err(failed) => failed,
        };

        warn!(document.id = %failed.filename, error = %failed.error, "document not indexed");
        IngestResult::failed(&failed.filename, &failed.error, failed.warnings)
    }

    /// Ingest a single document: extract → chunk → embed → store.
    ///
    /// Never returns an error; failures are reported in the [`IngestResult`].
    pub async fn ingest(&self, document: SourceDocument) -> IngestResult {
        let prepared = self.prepare(document).await;
        self.commit(prepared).await
    }

    /// Ingest several documents with per-document failure isolation.
    ///
    /// Up to `ingest_concurrency` documents are extracted and embedded at
    /// once; their entries are stored in input order, so the index (and thus
    /// tie-breaking in queries) does not depend on scheduling.
    pub async fn ingest_batch(&self, documents: Vec<SourceDocument>) -> IngestReport {
        let mut prepared = stream::iter(documents)
            .map(|document| self.prepare(document))
            .buffered(self.config.ingest_concurrency);

        let mut report = IngestReport::default();
        while let Some(document) = prepared.next().await {
            report.outcomes.push(self.commit(document).await);
        }

        info!(
            documents = report.outcomes.len(),
            succeeded = report.success_count(),
            chunk_count = report.chunks_indexed(),
            "batch ingestion finished"
        );
        report
    }

    /// Query the pipeline: embed the question once, then search.
    ///
    /// Returns at most `top_k` results ordered by ascending distance. A blank
    /// question or an empty store yields an empty result rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `top_k` is zero, and propagates
    /// embedding errors such as [`RagError::EmbeddingUnavailable`] unchanged.
    pub async fn query(&self, question: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        self.run_query(question, top_k, None).await
    }

    /// Like [`query`](Self::query), restricted to chunks that pass `filter`.
    ///
    /// The filter is applied inside the store, so up to `top_k` matching
    /// chunks come back even when closer non-matching chunks exist.
    pub async fn query_filtered(
        &self,
        question: &str,
        top_k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<SearchResult>> {
        self.run_query(question, top_k, Some(filter)).await
    }

    async fn run_query(
        &self,
        question: &str,
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if question.trim().is_empty() {
            debug!("blank query, returning no results");
            return Ok(Vec::new());
        }
        if self.vector_store.len().await == 0 {
            debug!("index is empty, returning no results");
            return Ok(Vec::new());
        }

        // 1. Embed the query
        let query_embedding = self.embedding_provider.embed(question).await.inspect_err(|e| {
            error!(error = %e, "embedding failed during query");
        })?;

        // 2. Search the vector store
        let search = match filter {
            Some(filter) => {
                self.vector_store.search_filtered(&query_embedding, top_k, filter).await
            }
            None => self.vector_store.search(&query_embedding, top_k).await,
        };
        let results = search.inspect_err(|e| {
            error!(error = %e, "vector store search failed");
        })?;

        info!(
            result_count = results.len(),
            top_k,
            filtered = filter.is_some(),
            "query completed"
        );

        Ok(results)
    }
}

/// Builder for constructing a [`RetrievalPipeline`].
///
/// Only the embedding provider is required. The configuration defaults to
/// [`RagConfig::default()`], the store to an [`InMemoryVectorStore`] sized for
/// the provider, and the chunker to the configured strategy.
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = RetrievalPipeline::builder()
///     .config(config)
///     .embedding_provider(Arc::new(embedder))
///     .vector_store(Arc::new(store))  // optional
///     .build()?;
/// ```
#[derive(Default)]
pub struct RetrievalPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
    extractors: Option<ExtractorRegistry>,
}

impl RetrievalPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Override the chunker chosen by the configuration.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Override the document extractors.
    pub fn extractors(mut self, extractors: ExtractorRegistry) -> Self {
        self.extractors = Some(extractors);
        self
    }

    /// Build the [`RetrievalPipeline`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the embedding provider is missing,
    /// the configuration is invalid, or the store's dimension differs from
    /// the provider's.
    pub fn build(self) -> Result<RetrievalPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;

        let vector_store = match self.vector_store {
            Some(store) => store,
            None => {
                Arc::new(InMemoryVectorStore::new(embedding_provider.dimensions(), config.metric))
            }
        };
        if vector_store.dimensions() != embedding_provider.dimensions() {
            return Err(RagError::ConfigError(format!(
                "vector store expects {}-dimensional vectors but {} produces {}",
                vector_store.dimensions(),
                embedding_provider.model_name(),
                embedding_provider.dimensions()
            )));
        }

        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => config.chunking.build(config.chunk_size, config.chunk_overlap)?,
        };

        Ok(RetrievalPipeline {
            config,
            embedding_provider,
            vector_store,
            chunker,
            extractors: self.extractors.unwrap_or_default(),
        })
    }
}
