use crate::concurrent_map::ConcurrentMap;
use crate::config::SearchConfig;
use crate::document::{rank_documents, Document, DocumentStatus};
use crate::error::SearchError;
use crate::index::InvertedIndex;
use crate::policy::ExecutionPolicy;
use crate::tokenizer::{self, Query, StopWords};
use crate::DocId;
use std::collections::{btree_set, BTreeMap, BTreeSet};
use std::iter::Copied;
use std::sync::Arc;

pub type WordFrequencies = BTreeMap<Arc<str>, f64>;

static EMPTY_FREQUENCIES: WordFrequencies = BTreeMap::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DocumentRecord {
    rating: i32,
    status: DocumentStatus,
}

/// The search engine: stop words, inverted and forward indices, and per
/// document rating/status.
///
/// Mutation takes `&mut self`; any number of reads may run at once.
#[derive(Debug)]
pub struct SearchServer {
    config: SearchConfig,
    stop_words: StopWords,
    inverted: InvertedIndex,
    forward: BTreeMap<DocId, WordFrequencies>,
    documents: BTreeMap<DocId, DocumentRecord>,
    document_ids: BTreeSet<DocId>,
}

impl SearchServer {
    pub fn new<I, S>(stop_words: I) -> Result<Self, SearchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_config(stop_words, SearchConfig::default())
    }

    /// Stop words separated by spaces.
    pub fn from_stop_words_text(text: &str) -> Result<Self, SearchError> {
        Self::new(tokenizer::split_into_words(text))
    }

    pub fn with_config<I, S>(stop_words: I, config: SearchConfig) -> Result<Self, SearchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            config,
            stop_words: StopWords::new(stop_words)?,
            inverted: InvertedIndex::new(),
            forward: BTreeMap::new(),
            documents: BTreeMap::new(),
            document_ids: BTreeSet::new(),
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }

    pub fn inverted_index(&self) -> &InvertedIndex {
        &self.inverted
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Live document ids in ascending order.
    pub fn iter(&self) -> Copied<btree_set::Iter<'_, DocId>> {
        self.document_ids.iter().copied()
    }

    pub fn contains(&self, document_id: DocId) -> bool {
        self.document_ids.contains(&document_id)
    }

    pub fn add_document(
        &mut self,
        document_id: DocId,
        document: &str,
        status: DocumentStatus,
        ratings: &[i32],
    ) -> Result<(), SearchError> {
        if document_id < 0 || self.documents.contains_key(&document_id) {
            return Err(SearchError::InvalidId(document_id));
        }
        let words = tokenizer::split_into_words_no_stop(document, &self.stop_words)?;

        let mut frequencies = WordFrequencies::new();
        if !words.is_empty() {
            let inv_word_count = 1.0 / words.len() as f64;
            for word in &words {
                let handle = self.inverted.add_posting(word, document_id, inv_word_count);
                *frequencies.entry(handle).or_insert(0.0) += inv_word_count;
            }
        }
        let distinct_words = frequencies.len();
        self.forward.insert(document_id, frequencies);
        self.documents.insert(
            document_id,
            DocumentRecord { rating: compute_average_rating(ratings), status },
        );
        self.document_ids.insert(document_id);
        tracing::debug!(document_id, words = words.len(), distinct_words, "document added");
        Ok(())
    }

    pub fn remove_document(&mut self, document_id: DocId) {
        self.remove_document_with(ExecutionPolicy::Sequential, document_id);
    }

    /// Unknown ids are ignored.
    pub fn remove_document_with(&mut self, policy: ExecutionPolicy, document_id: DocId) {
        let Some(frequencies) = self.forward.get(&document_id) else {
            return;
        };
        self.inverted
            .remove_document(policy, document_id, frequencies.keys().map(|w| &**w));

        self.forward.remove(&document_id);
        self.documents.remove(&document_id);
        self.document_ids.remove(&document_id);
        tracing::debug!(document_id, ?policy, "document removed");
    }

    /// Word frequencies of one document; empty for unknown ids.
    pub fn word_frequencies(&self, document_id: DocId) -> &WordFrequencies {
        self.forward.get(&document_id).unwrap_or(&EMPTY_FREQUENCIES)
    }

    pub fn match_document(
        &self,
        raw_query: &str,
        document_id: DocId,
    ) -> Result<(Vec<&str>, DocumentStatus), SearchError> {
        self.match_document_with(ExecutionPolicy::Sequential, raw_query, document_id)
    }

    /// Plus words found in the document, sorted and unique; empty when any
    /// minus word is found.
    pub fn match_document_with(
        &self,
        policy: ExecutionPolicy,
        raw_query: &str,
        document_id: DocId,
    ) -> Result<(Vec<&str>, DocumentStatus), SearchError> {
        let (Some(record), Some(words)) =
            (self.documents.get(&document_id), self.forward.get(&document_id))
        else {
            return Err(SearchError::UnknownDocument(document_id));
        };
        let query = tokenizer::parse_query(raw_query, &self.stop_words)?;

        if policy.any(&query.minus_words, |word| words.contains_key(*word)) {
            return Ok((Vec::new(), record.status));
        }

        let mut matched: Vec<&str> = policy
            .filter(&query.plus_words, |word| words.contains_key(*word))
            .into_iter()
            .filter_map(|word| words.get_key_value(word).map(|(handle, _)| handle.as_ref()))
            .collect();
        matched.sort_unstable();
        matched.dedup();
        Ok((matched, record.status))
    }

    pub fn find_top_documents(&self, raw_query: &str) -> Result<Vec<Document>, SearchError> {
        self.find_top_documents_by_status(raw_query, DocumentStatus::Actual)
    }

    pub fn find_top_documents_by_status(
        &self,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>, SearchError> {
        self.find_top_documents_by_status_with(ExecutionPolicy::Sequential, raw_query, status)
    }

    pub fn find_top_documents_by<P>(
        &self,
        raw_query: &str,
        predicate: P,
    ) -> Result<Vec<Document>, SearchError>
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool + Sync,
    {
        self.find_top_documents_with(ExecutionPolicy::Sequential, raw_query, predicate)
    }

    pub fn find_top_documents_by_status_with(
        &self,
        policy: ExecutionPolicy,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>, SearchError> {
        self.find_top_documents_with(policy, raw_query, move |_, doc_status, _| doc_status == status)
    }

    /// Best `max_results` documents passing `predicate(id, status, rating)`.
    pub fn find_top_documents_with<P>(
        &self,
        policy: ExecutionPolicy,
        raw_query: &str,
        predicate: P,
    ) -> Result<Vec<Document>, SearchError>
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool + Sync,
    {
        let mut query = tokenizer::parse_query(raw_query, &self.stop_words)?;
        query.dedup();

        let mut matched = self.find_all_documents(policy, &query, &predicate);
        rank_documents(policy, &mut matched, self.config.relevance_epsilon);
        matched.truncate(self.config.max_results);
        Ok(matched)
    }

    fn find_all_documents<P>(
        &self,
        policy: ExecutionPolicy,
        query: &Query<'_>,
        predicate: &P,
    ) -> Vec<Document>
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool + Sync,
    {
        let relevance: ConcurrentMap<DocId, f64> = ConcurrentMap::new(self.config.bucket_count);

        policy.for_each(&query.plus_words, |word| {
            let Some(postings) = self.inverted.postings(word) else {
                return;
            };
            let idf = self.inverse_document_freq(postings.len());
            for (&document_id, &term_freq) in postings {
                let Some(record) = self.documents.get(&document_id) else {
                    continue;
                };
                if predicate(document_id, record.status, record.rating) {
                    *relevance.access(document_id) += term_freq * idf;
                }
            }
        });

        policy.for_each(&query.minus_words, |word| {
            if let Some(postings) = self.inverted.postings(word) {
                for &document_id in postings.keys() {
                    relevance.erase(document_id);
                }
            }
        });

        relevance
            .into_ordinary_map()
            .into_iter()
            .filter_map(|(id, value)| {
                self.documents
                    .get(&id)
                    .map(|record| Document::new(id, value, record.rating))
            })
            .collect()
    }

    // Only called for words present in the index, so `document_freq` > 0.
    fn inverse_document_freq(&self, document_freq: usize) -> f64 {
        (self.document_count() as f64 / document_freq as f64).ln()
    }
}

impl<'a> IntoIterator for &'a SearchServer {
    type Item = DocId;
    type IntoIter = Copied<btree_set::Iter<'a, DocId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Integer mean truncated toward zero; 0 for no ratings.
fn compute_average_rating(ratings: &[i32]) -> i32 {
    if ratings.is_empty() {
        return 0;
    }
    let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
    (sum / ratings.len() as i64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_with(stop_words: &str, docs: Vec<(DocId, &str, Vec<i32>)>) -> SearchServer {
        let mut server = SearchServer::from_stop_words_text(stop_words).unwrap();
        for (id, text, ratings) in docs {
            server
                .add_document(id, text, DocumentStatus::Actual, &ratings)
                .unwrap();
        }
        server
    }

    #[test]
    fn average_rating_truncates_toward_zero() {
        assert_eq!(compute_average_rating(&[]), 0);
        assert_eq!(compute_average_rating(&[1, 2]), 1);
        assert_eq!(compute_average_rating(&[1, 2, 3, 4, 5, 5]), 3);
        assert_eq!(compute_average_rating(&[-5, -2]), -3);
        assert_eq!(compute_average_rating(&[i32::MAX, i32::MAX]), i32::MAX);
    }

    #[test]
    fn rejects_negative_and_duplicate_ids() {
        let mut server = server_with("", vec![(1, "cat", vec![1])]);
        assert_eq!(
            server.add_document(-1, "dog", DocumentStatus::Actual, &[]),
            Err(SearchError::InvalidId(-1))
        );
        assert_eq!(
            server.add_document(1, "dog", DocumentStatus::Actual, &[]),
            Err(SearchError::InvalidId(1))
        );
        assert_eq!(server.document_count(), 1);
    }

    #[test]
    fn invalid_word_leaves_index_untouched() {
        let mut server = server_with("", vec![]);
        let err = server
            .add_document(1, "good b\x10ad", DocumentStatus::Actual, &[1])
            .unwrap_err();
        assert_eq!(err, SearchError::InvalidWord("b\x10ad".into()));
        assert_eq!(server.document_count(), 0);
        assert!(server.inverted_index().is_empty());
        assert!(!server.contains(1));
    }

    #[test]
    fn term_frequency_counts_repeats() {
        let server = server_with("and with", vec![(4, "pet with rat and rat and rat", vec![])]);
        let freqs = server.word_frequencies(4);
        assert_eq!(freqs.len(), 2);
        assert!((freqs["rat"] - 0.75).abs() < 1e-12);
        assert!((freqs["pet"] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn stop_word_only_document_is_live_but_empty() {
        let server = server_with("and with", vec![(1, "and with", vec![2, 4])]);
        assert!(server.contains(1));
        assert!(server.word_frequencies(1).is_empty());
        let (words, status) = server.match_document("and", 1).unwrap();
        assert!(words.is_empty());
        assert_eq!(status, DocumentStatus::Actual);
    }

    #[test]
    fn match_unknown_document_fails() {
        let server = server_with("", vec![(1, "cat", vec![])]);
        assert_eq!(
            server.match_document("cat", 2),
            Err(SearchError::UnknownDocument(2))
        );
    }

    #[test]
    fn match_reports_invalid_query() {
        let server = server_with("", vec![(1, "cat", vec![])]);
        assert!(matches!(
            server.match_document_with(ExecutionPolicy::Parallel, "cat --dog", 1),
            Err(SearchError::InvalidQuery(_))
        ));
    }

    #[test]
    fn relevance_is_tf_idf() {
        let server = server_with(
            "",
            vec![(0, "white cat", vec![1]), (1, "black dog", vec![2]), (2, "white dog", vec![3])],
        );
        let docs = server.find_top_documents("cat").unwrap();
        assert_eq!(docs.len(), 1);
        let expected = 0.5 * (3.0f64 / 1.0).ln();
        assert!((docs[0].relevance - expected).abs() < 1e-12);
    }

    #[test]
    fn cap_limits_results() {
        let mut server = SearchServer::with_config(
            ["x"],
            SearchConfig::default().with_max_results(2),
        )
        .unwrap();
        for id in 0..6 {
            server
                .add_document(id, "common word", DocumentStatus::Actual, &[id])
                .unwrap();
        }
        let docs = server.find_top_documents("common").unwrap();
        assert_eq!(docs.len(), 2);
        // identical relevance, so highest ratings first
        assert_eq!(docs.iter().map(|d| d.id).collect::<Vec<_>>(), vec![5, 4]);
    }

    #[test]
    fn removal_of_unknown_id_is_noop() {
        let mut server = server_with("", vec![(1, "cat", vec![])]);
        server.remove_document(7);
        server.remove_document_with(ExecutionPolicy::Parallel, 7);
        assert_eq!(server.document_count(), 1);
        assert_eq!(server.inverted_index().len(), 1);
    }

    #[test]
    fn removed_id_can_be_added_again() {
        let mut server = server_with("", vec![(1, "cat", vec![])]);
        server.remove_document(1);
        server
            .add_document(1, "dog", DocumentStatus::Banned, &[9])
            .unwrap();
        assert!(server.inverted_index().postings("cat").is_none());
        let docs = server
            .find_top_documents_by_status("dog", DocumentStatus::Banned)
            .unwrap();
        assert_eq!(docs, vec![Document::new(1, 0.0, 9)]);
    }

    #[test]
    fn iterates_ids_in_ascending_order() {
        let server = server_with("", vec![(5, "a", vec![]), (1, "b", vec![]), (3, "c", vec![])]);
        assert_eq!(server.iter().collect::<Vec<_>>(), vec![1, 3, 5]);
        let mut seen = Vec::new();
        for id in &server {
            seen.push(id);
        }
        assert_eq!(seen, vec![1, 3, 5]);
    }
}
