//! Deterministic local embeddings using the hashing trick.
//!
//! [`HashingEmbedder`] needs no model download and no network, which makes it
//! the default for tests, demos and offline sessions. It captures lexical
//! rather than semantic similarity: texts sharing words and word pairs end up
//! close together.

use async_trait::async_trait;

use crate::embedding::EmbeddingProvider;
use crate::error::Result;

const DEFAULT_DIMENSIONS: usize = 384;
const BIGRAM_WEIGHT: f32 = 0.5;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(parts: &[&str]) -> u64 {
    let mut hash = FNV_OFFSET;
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hash ^= u64::from(b' ');
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        for byte in part.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    }
    hash
}

/// An [`EmbeddingProvider`] based on signed feature hashing.
///
/// Text is lower-cased and split into alphanumeric words. Every word and every
/// adjacent word pair is hashed with FNV-1a into one of `dimensions` buckets;
/// one hash bit picks the sign so collisions tend to cancel. The vector is
/// L2-normalised. Text without words maps to the zero vector.
///
/// Output depends only on the input text and `dimensions`.
///
/// # Example
///
/// ```rust,ignore
/// use scholar_rag::HashingEmbedder;
///
/// let embedder = HashingEmbedder::new(256);
/// let vector = embedder.embed("protein folding").await?;
/// assert_eq!(vector.len(), 256);
/// ```
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
    model_name: String,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

impl HashingEmbedder {
    /// Create an embedder producing vectors of `dimensions` components.
    ///
    /// A dimension of zero is raised to one.
    pub fn new(dimensions: usize) -> Self {
        let dimensions = dimensions.max(1);
        Self { dimensions, model_name: format!("feature-hash-{dimensions}") }
    }

    fn add_feature(&self, vector: &mut [f32], hash: u64, weight: f32) {
        let bucket = (hash % self.dimensions as u64) as usize;
        let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }

    /// Compute the embedding synchronously.
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        let words: Vec<&str> =
            lowered.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()).collect();

        let mut vector = vec![0.0f32; self.dimensions];
        for &word in &words {
            self.add_feature(&mut vector, fnv1a(&[word]), 1.0);
        }
        for pair in words.windows(2) {
            self.add_feature(&mut vector, fnv1a(pair), BIGRAM_WEIGHT);
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_sync(text)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn vectors_are_unit_length() {
        let v = HashingEmbedder::new(64).embed_sync("CRISPR gene editing in mice");
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn text_without_words_is_the_zero_vector() {
        let v = HashingEmbedder::new(16).embed_sync("  ... !!! ");
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn case_and_punctuation_are_ignored() {
        let embedder = HashingEmbedder::new(128);
        assert_eq!(
            embedder.embed_sync("Insulin, resistance."),
            embedder.embed_sync("insulin resistance")
        );
    }

    #[test]
    fn shared_vocabulary_is_closer() {
        let embedder = HashingEmbedder::default();
        let query = embedder.embed_sync("insulin resistance in type 2 diabetes");
        let related = embedder.embed_sync("type 2 diabetes is driven by insulin resistance");
        let unrelated = embedder.embed_sync("the migration patterns of arctic terns");
        assert!(dot(&query, &related) > dot(&query, &unrelated));
    }

    #[test]
    fn zero_dimensions_is_raised_to_one() {
        assert_eq!(HashingEmbedder::new(0).dimensions(), 1);
    }
}
