//! In-memory similarity index over the current round's chunks.
//!
//! The store is namespaced by round id: `begin_round` discards everything from
//! the previous round, and both upserts and queries carry the namespace they
//! were issued for. A stale upsert (e.g. an embedding that resolves after the
//! player started a new round) is ignored instead of contaminating the fresh
//! round, and a stale query returns nothing.
//!
//! Vectors come from the embedding service; when the service is not
//! configured, chunks are stored without vectors and lookups fall back to
//! lexical token overlap so the game stays playable offline.

use tracing::{debug, warn};

use crate::domain::Chunk;

#[derive(Clone, Debug)]
struct IndexedChunk {
    chunk: Chunk,
    vector: Option<Vec<f32>>,
}

#[derive(Debug, Default)]
pub struct SemanticIndex {
    namespace: String,
    records: Vec<IndexedChunk>,
}

impl SemanticIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a fresh round: all previously indexed chunks are dropped.
    pub fn begin_round(&mut self, namespace: String) {
        debug!(target: "game", %namespace, dropped = self.records.len(), "Semantic index reset for new round");
        self.namespace = namespace;
        self.records.clear();
    }

    /// Store one chunk (optionally with its embedding) under `namespace`.
    /// Returns false when the namespace is stale; the record is discarded.
    pub fn upsert(&mut self, namespace: &str, chunk: Chunk, vector: Option<Vec<f32>>) -> bool {
        if namespace != self.namespace {
            warn!(target: "game", %namespace, active = %self.namespace, chunk_id = chunk.id,
                  "Dropping upsert for stale round namespace");
            return false;
        }
        if chunk.text.trim().is_empty() {
            return false;
        }
        self.records.push(IndexedChunk { chunk, vector });
        true
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Top-k chunks by cosine similarity against `vector`, best first.
    /// Chunks stored without a vector are skipped. Empty for a stale namespace.
    pub fn query_vector(&self, namespace: &str, vector: &[f32], k: usize) -> Vec<Chunk> {
        if namespace != self.namespace {
            return Vec::new();
        }
        let mut scored: Vec<(f64, &Chunk)> = self
            .records
            .iter()
            .filter_map(|r| {
                r.vector
                    .as_deref()
                    .map(|v| (cosine_similarity(v, vector), &r.chunk))
            })
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().take(k).map(|(_, c)| c.clone()).collect()
    }

    /// Lexical fallback: rank chunks by case-insensitive token overlap with
    /// the query text. Used when no embedding service is configured.
    pub fn query_lexical(&self, namespace: &str, text: &str, k: usize) -> Vec<Chunk> {
        if namespace != self.namespace {
            return Vec::new();
        }
        let needle = text.to_lowercase();
        let query_tokens: Vec<&str> = needle.split_whitespace().collect();
        if query_tokens.is_empty() {
            return Vec::new();
        }
        let mut scored: Vec<(usize, &Chunk)> = self
            .records
            .iter()
            .map(|r| {
                let haystack = r.chunk.text.to_lowercase();
                let hits = query_tokens.iter().filter(|t| haystack.contains(**t)).count();
                (hits, &r.chunk)
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.id.cmp(&b.1.id)));
        scored.into_iter().take(k).map(|(_, c)| c.clone()).collect()
    }
}

/// Cosine similarity between two vectors. Returns 0.0 on mismatch or
/// near-zero norms.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-12 {
        0.0
    } else {
        dot / denom
    }
}
