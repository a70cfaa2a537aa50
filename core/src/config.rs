use serde::{Deserialize, Serialize};

pub const MAX_RESULT_DOCUMENT_COUNT: usize = 5;
pub const DEFAULT_BUCKET_COUNT: usize = 16;
pub const RELEVANCE_EPSILON: f64 = 1e-6;

/// Tunables of a [`crate::SearchServer`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Upper bound on the number of documents a top-documents query returns.
    pub max_results: usize,
    /// Shard count of the relevance accumulator used while ranking.
    pub bucket_count: usize,
    /// Relevance values closer than this are ranked by rating instead.
    pub relevance_epsilon: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: MAX_RESULT_DOCUMENT_COUNT,
            bucket_count: DEFAULT_BUCKET_COUNT,
            relevance_epsilon: RELEVANCE_EPSILON,
        }
    }
}

impl SearchConfig {
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }
}
