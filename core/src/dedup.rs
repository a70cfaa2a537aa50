use crate::server::SearchServer;
use crate::DocId;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Removes every document whose set of indexed words equals that of a
/// document with a lower id. Returns the removed ids in ascending order.
pub fn remove_duplicates(server: &mut SearchServer) -> Vec<DocId> {
    let mut seen: BTreeSet<Vec<Arc<str>>> = BTreeSet::new();
    let duplicates: Vec<DocId> = server
        .iter()
        .filter(|&document_id| {
            let words: Vec<Arc<str>> = server.word_frequencies(document_id).keys().cloned().collect();
            !seen.insert(words)
        })
        .collect();

    for &document_id in &duplicates {
        tracing::info!(document_id, "found duplicate document");
        server.remove_document(document_id);
    }
    duplicates
}
