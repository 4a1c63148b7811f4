//! Exact brute-force similarity index.
//!
//! [`FlatIndex`] stores `(vector, chunk)` pairs and answers k-nearest-neighbour
//! queries with a linear scan. It is the reference implementation: results
//! are exact, ordered by ascending distance, and ties go to the entry that was
//! inserted first.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};

/// The distance function an index uses. Fixed for the index's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// L2 distance.
    #[default]
    Euclidean,
    /// Negated dot product, so larger inner products rank closer.
    InnerProduct,
    /// `1 - cosine similarity`; a zero vector is at distance 1 from everything.
    Cosine,
}

impl DistanceMetric {
    /// Distance between two vectors of equal length.
    pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        let distance = match self {
            DistanceMetric::Euclidean => {
                a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt()
            }
            DistanceMetric::InnerProduct => -dot(a, b),
            DistanceMetric::Cosine => 1.0 - cosine_similarity(a, b),
        };
        // -0.0 + 0.0 == +0.0; keeps exact ties comparing equal under total_cmp.
        distance + 0.0
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot(a, b) / (norm_a * norm_b)
}

/// One stored vector with the chunk it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    /// The embedding.
    pub vector: Vec<f32>,
    /// The chunk the embedding belongs to.
    pub chunk: Chunk,
}

/// Restricts a search to chunks whose metadata value under `key` is one of
/// the allowed values. Chunks without the key never match.
///
/// # Example
///
/// ```rust,ignore
/// use scholar_rag::{DOC_TYPE_KEY, MetadataFilter};
///
/// let reviews_only = MetadataFilter::new(DOC_TYPE_KEY, ["Systematic Review"]);
/// let nearest = index.query_filtered(&query, 5, &reviews_only)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataFilter {
    key: String,
    allowed: HashSet<String>,
}

impl MetadataFilter {
    /// Accept chunks whose `key` metadata equals any of `allowed`.
    pub fn new<I, S>(key: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { key: key.into(), allowed: allowed.into_iter().map(Into::into).collect() }
    }

    /// The metadata key the filter inspects.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether `chunk` passes the filter.
    pub fn matches(&self, chunk: &Chunk) -> bool {
        chunk.metadata.get(&self.key).is_some_and(|value| self.allowed.contains(value))
    }
}

/// A brute-force k-NN index over vectors of one fixed dimension.
///
/// Entries are kept in insertion order; nothing is deduplicated.
///
/// # Example
///
/// ```rust,ignore
/// use scholar_rag::{DistanceMetric, FlatIndex};
///
/// let mut index = FlatIndex::new(3, DistanceMetric::Euclidean);
/// index.insert(vec![0.0, 0.0, 1.0], chunk)?;
/// let nearest = index.query(&[0.0, 0.1, 0.9], 5)?;
/// ```
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimensions: usize,
    metric: DistanceMetric,
    entries: Vec<IndexEntry>,
}

impl FlatIndex {
    /// Create an empty index for `dimensions`-long vectors compared with `metric`.
    pub fn new(dimensions: usize, metric: DistanceMetric) -> Self {
        Self { dimensions, metric, entries: Vec::new() }
    }

    /// The vector dimension this index accepts.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// The distance metric fixed at construction.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check_dimensions(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// Append one entry.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] if `vector` has the wrong
    /// length; the index is left unchanged.
    pub fn insert(&mut self, vector: Vec<f32>, chunk: Chunk) -> Result<()> {
        self.check_dimensions(&vector)?;
        self.entries.push(IndexEntry { vector, chunk });
        Ok(())
    }

    /// Append several entries, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] for the first vector of the
    /// wrong length; no entry from the batch is added.
    pub fn insert_batch(&mut self, entries: Vec<IndexEntry>) -> Result<()> {
        for entry in &entries {
            self.check_dimensions(&entry.vector)?;
        }
        self.entries.extend(entries);
        Ok(())
    }

    /// Return the `k` entries closest to `vector`, closest first.
    ///
    /// The result has `min(k, len)` elements. An empty index yields an empty
    /// result. Entries at exactly equal distance keep insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] if `vector` has the wrong length.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        self.rank(vector, k, None)
    }

    /// Like [`query`](Self::query), but only entries whose chunk passes
    /// `filter` are ranked, so up to `k` matching entries are returned even
    /// when closer non-matching entries exist.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] if `vector` has the wrong length.
    pub fn query_filtered(
        &self,
        vector: &[f32],
        k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<SearchResult>> {
        self.rank(vector, k, Some(filter))
    }

    fn rank(
        &self,
        vector: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchResult>> {
        self.check_dimensions(vector)?;
        if k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f32, usize)> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| filter.is_none_or(|f| f.matches(&entry.chunk)))
            .map(|(position, entry)| (self.metric.distance(&entry.vector, vector), position))
            .collect();

        let by_distance_then_position = |a: &(f32, usize), b: &(f32, usize)| -> Ordering {
            a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
        };

        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_distance_then_position);
            scored.truncate(k);
        }
        scored.sort_unstable_by(by_distance_then_position);

        Ok(scored
            .into_iter()
            .map(|(distance, position)| SearchResult {
                chunk: self.entries[position].chunk.clone(),
                distance,
            })
            .collect())
    }

    /// Remove every entry. Dimensions and metric are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate over stored entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }
}
