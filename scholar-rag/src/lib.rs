//! # scholar-rag
//!
//! Session-scoped document retrieval for a research assistant.
//!
//! ## Overview
//!
//! Users upload papers during a session; the crate turns them into searchable
//! evidence and answers similarity queries against it:
//!
//! - [`ExtractorRegistry`] - page text from PDFs and UTF-8 text files
//! - [`FixedSizeChunker`] / [`RecursiveChunker`] - overlapping character windows
//! - [`EmbeddingProvider`] - [`HashingEmbedder`] offline, `FastEmbedProvider` with
//!   the `fastembed` feature
//! - [`FlatIndex`] / [`InMemoryVectorStore`] - exact k-nearest-neighbour search
//! - [`RetrievalPipeline`] - ingest and query orchestration
//! - [`ResearchSession`] - one session's index, ledger and evidence rendering
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use scholar_rag::{HashingEmbedder, RagConfig, ResearchSession};
//!
//! let session = ResearchSession::new(RagConfig::default(), Arc::new(HashingEmbedder::default()))?;
//! let outcome = session.ingest(std::fs::read("paper.pdf")?, "paper.pdf").await;
//! for hit in session.retrieve("effect size of the intervention", 5).await? {
//!     println!("{} #{} ({:.3}): {}", hit.source(), hit.chunk_index(), hit.distance, hit.text());
//! }
//! ```
//!
//! ## Features
//!
//! - `fastembed` - local sentence-transformer embeddings via the `fastembed` crate

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod evidence;
pub mod extract;
pub mod hashing;
pub mod index;
pub mod inmemory;
pub mod pipeline;
pub mod session;
pub mod vectorstore;

#[cfg(feature = "fastembed")]
pub mod fastembed_provider;

pub use chunking::{Chunker, ChunkingStrategy, FixedSizeChunker, RecursiveChunker, chunk_text};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{
    Chunk, DocumentKind, ExtractedText, IngestReport, IngestResult, SearchResult, SourceDocument,
};
pub use embedding::{EmbeddingProvider, embed_in_batches};
pub use error::{RagError, Result};
pub use evidence::{DOC_TYPE_KEY, EvidenceBlock, render_evidence};
pub use extract::{ExtractorRegistry, PdfExtractor, PlainTextExtractor, TextExtractor};
pub use hashing::HashingEmbedder;
pub use index::{DistanceMetric, FlatIndex, IndexEntry, MetadataFilter};
pub use inmemory::InMemoryVectorStore;
pub use pipeline::{RetrievalPipeline, RetrievalPipelineBuilder};
pub use session::{IndexedDocument, ResearchSession, SessionStatus};
pub use vectorstore::VectorStore;

#[cfg(feature = "fastembed")]
pub use fastembed_provider::{FastEmbedProvider, SentenceModel};
