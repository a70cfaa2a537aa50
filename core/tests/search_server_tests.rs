use std::collections::BTreeMap;

use search_core::{
    remove_duplicates, Document, DocumentStatus, ExecutionPolicy, SearchConfig, SearchError,
    SearchServer,
};

const POLICIES: [ExecutionPolicy; 2] = [ExecutionPolicy::Sequential, ExecutionPolicy::Parallel];

fn pets_server() -> SearchServer {
    let mut server = SearchServer::from_stop_words_text("and with").unwrap();
    let texts = [
        "funny pet and nasty rat",
        "funny pet with curly hair",
        "funny pet and not very nasty rat",
        "pet with rat and rat and rat",
        "nasty rat with curly hair",
    ];
    for (i, text) in texts.iter().enumerate() {
        server
            .add_document(i as i32 + 1, text, DocumentStatus::Actual, &[1, 2])
            .unwrap();
    }
    server
}

/// Deterministic pseudo-random corpus for equivalence checks.
fn generated_server(docs: i32) -> SearchServer {
    let vocabulary: Vec<String> = (0..60).map(|i| format!("w{i}")).collect();
    let mut server = SearchServer::new(["w0", "w1"]).unwrap();
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };
    for id in 0..docs {
        let len = 3 + (next() % 12) as usize;
        let text: Vec<&str> = (0..len)
            .map(|_| vocabulary[(next() % vocabulary.len() as u64) as usize].as_str())
            .collect();
        let status = match next() % 4 {
            0 => DocumentStatus::Banned,
            _ => DocumentStatus::Actual,
        };
        let ratings = [(next() % 10) as i32, (next() % 10) as i32];
        server.add_document(id, &text.join(" "), status, &ratings).unwrap();
    }
    server
}

fn index_snapshot(server: &SearchServer) -> BTreeMap<String, Vec<(i32, f64)>> {
    server
        .inverted_index()
        .iter()
        .map(|(word, postings)| {
            let postings: Vec<(i32, f64)> = postings.iter().map(|(id, freq)| (*id, *freq)).collect();
            (word.to_string(), postings)
        })
        .collect()
}

fn assert_consistent(server: &SearchServer) {
    let index = server.inverted_index();
    for (word, postings) in index.iter() {
        assert!(!postings.is_empty(), "empty posting list left for {word}");
        for (doc_id, freq) in postings {
            assert_eq!(server.word_frequencies(*doc_id).get(word), Some(freq));
        }
    }
    for doc_id in server {
        let freqs = server.word_frequencies(doc_id);
        for (word, freq) in freqs {
            assert_eq!(index.postings(word).and_then(|p| p.get(&doc_id)), Some(freq));
        }
        if !freqs.is_empty() {
            let total: f64 = freqs.values().sum();
            assert!((total - 1.0).abs() < 1e-9, "document {doc_id} frequencies sum to {total}");
        }
    }
}

#[test]
fn match_scenario_with_minus_word() {
    let server = pets_server();
    let query = "curly and funny rat rat -not";
    let expected: Vec<(i32, Vec<&str>)> = vec![
        (1, vec!["funny", "rat"]),
        (2, vec!["curly", "funny"]),
        (3, vec![]),
        (4, vec!["rat"]),
        (5, vec!["curly", "rat"]),
    ];
    for policy in POLICIES {
        for (doc_id, words) in &expected {
            let (matched, status) = server.match_document_with(policy, query, *doc_id).unwrap();
            assert_eq!(&matched, words, "document {doc_id} under {policy:?}");
            assert_eq!(status, DocumentStatus::Actual);
        }
    }
}

#[test]
fn minus_word_excludes_best_match() {
    let server = pets_server();
    let without_minus = server.find_top_documents("nasty rat").unwrap();
    assert!(without_minus.iter().any(|d| d.id == 3));

    for policy in POLICIES {
        let docs = server
            .find_top_documents_by_status_with(policy, "nasty rat -not", DocumentStatus::Actual)
            .unwrap();
        assert!(!docs.is_empty());
        assert!(docs.iter().all(|d| d.id != 3));
    }
}

#[test]
fn stop_word_query_finds_nothing() {
    let server = pets_server();
    for policy in POLICIES {
        let docs = server
            .find_top_documents_with(policy, "and with -and", |_, _, _| true)
            .unwrap();
        assert!(docs.is_empty());
    }
}

#[test]
fn ranking_orders_by_relevance_then_rating() {
    let mut server = SearchServer::from_stop_words_text("in the").unwrap();
    server.add_document(0, "white cat and fashion collar", DocumentStatus::Actual, &[8, -3]).unwrap();
    server.add_document(1, "fluffy cat fluffy tail", DocumentStatus::Actual, &[7, 2, 7]).unwrap();
    server.add_document(2, "groomed dog expressive eyes", DocumentStatus::Actual, &[5, -12, 2, 1]).unwrap();
    server.add_document(3, "groomed starling eugene", DocumentStatus::Banned, &[9]).unwrap();

    let docs = server.find_top_documents("fluffy groomed cat").unwrap();
    let ids: Vec<_> = docs.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![1, 2, 0]);
    assert_eq!(docs[0].rating, 5);
    assert_eq!(docs[1].rating, -1);
    assert_eq!(docs[2].rating, 2);
    assert!(docs.windows(2).all(|w| w[0].relevance >= w[1].relevance));

    let banned = server
        .find_top_documents_by_status("fluffy groomed cat", DocumentStatus::Banned)
        .unwrap();
    assert_eq!(banned.iter().map(|d| d.id).collect::<Vec<_>>(), vec![3]);

    let even = server
        .find_top_documents_by("fluffy groomed cat", |id, _, _| id % 2 == 0)
        .unwrap();
    assert_eq!(even.iter().map(|d| d.id).collect::<Vec<_>>(), vec![2, 0]);
}

#[test]
fn predicate_sees_id_status_and_rating() {
    let server = pets_server();
    let docs = server
        .find_top_documents_by("curly", |id, status, rating| {
            id == 2 && status == DocumentStatus::Actual && rating == 1
        })
        .unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, 2);
}

#[test]
fn result_cap_is_configurable() {
    for cap in [0, 1, 3, 10] {
        let mut server =
            SearchServer::with_config(["and"], SearchConfig::default().with_max_results(cap)).unwrap();
        for id in 0..8 {
            server
                .add_document(id, &format!("shared unique{id}"), DocumentStatus::Actual, &[id])
                .unwrap();
        }
        let docs = server.find_top_documents("shared").unwrap();
        assert_eq!(docs.len(), cap.min(8));
    }
}

#[test]
fn invalid_queries_are_rejected() {
    let server = pets_server();
    for query in ["rat --pet", "rat -", "r\x07at"] {
        assert!(matches!(
            server.find_top_documents(query),
            Err(SearchError::InvalidQuery(_))
        ));
    }
}

#[test]
fn removal_is_idempotent_and_keeps_indices_symmetric() {
    for policy in POLICIES {
        let mut server = pets_server();
        assert_consistent(&server);

        server.remove_document_with(policy, 3);
        assert_consistent(&server);
        let count = server.document_count();
        let words = server.inverted_index().len();

        server.remove_document_with(policy, 3);
        assert_eq!(server.document_count(), count);
        assert_eq!(server.inverted_index().len(), words);

        // "not" and "very" only appeared in document 3
        assert!(server.inverted_index().postings("not").is_none());
        assert!(server.inverted_index().postings("very").is_none());
        assert!(server.word_frequencies(3).is_empty());
        assert_eq!(
            server.match_document("rat", 3),
            Err(SearchError::UnknownDocument(3))
        );
    }
}

#[test]
fn sequential_and_parallel_removal_reach_the_same_state() {
    let mut seq = generated_server(300);
    let mut par = generated_server(300);
    for id in (0..300).step_by(3) {
        seq.remove_document_with(ExecutionPolicy::Sequential, id);
        par.remove_document_with(ExecutionPolicy::Parallel, id);
    }
    assert_consistent(&seq);
    assert_consistent(&par);
    assert_eq!(seq.iter().collect::<Vec<_>>(), par.iter().collect::<Vec<_>>());
    for id in &seq {
        assert_eq!(seq.word_frequencies(id), par.word_frequencies(id));
    }
    assert_eq!(index_snapshot(&seq), index_snapshot(&par));
}

#[test]
fn sequential_and_parallel_queries_agree() {
    let server = generated_server(500);
    let queries = ["w2 w3 w4", "w5 w6 -w7", "w8 w8 w9 -w10 -w11", "w12", "-w13", "w0 w14"];
    for query in queries {
        let seq = server.find_top_documents_with(ExecutionPolicy::Sequential, query, |_, _, _| true).unwrap();
        let par = server.find_top_documents_with(ExecutionPolicy::Parallel, query, |_, _, _| true).unwrap();
        assert_eq!(seq.len(), par.len(), "query {query}");
        for (a, b) in seq.iter().zip(&par) {
            assert_eq!(a.id, b.id, "query {query}");
            assert_eq!(a.rating, b.rating);
            assert!((a.relevance - b.relevance).abs() < 1e-9);
        }
        for id in server.iter().take(50) {
            assert_eq!(
                server.match_document_with(ExecutionPolicy::Sequential, query, id),
                server.match_document_with(ExecutionPolicy::Parallel, query, id),
            );
        }
    }
}

#[test]
fn duplicates_removed_keep_lower_id() {
    let mut server = SearchServer::from_stop_words_text("and").unwrap();
    server.add_document(10, "rat and cat", DocumentStatus::Actual, &[]).unwrap();
    server.add_document(4, "cat cat rat", DocumentStatus::Actual, &[]).unwrap();
    server.add_document(7, "dog", DocumentStatus::Actual, &[]).unwrap();
    assert_eq!(remove_duplicates(&mut server), vec![10]);
    assert_consistent(&server);
    assert_eq!(
        server.find_top_documents("rat").unwrap(),
        vec![Document::new(4, (1.0 / 3.0) * 2.0f64.ln(), 0)]
    );
}

#[test]
fn long_documents_with_near_tied_relevance_rank_the_same_under_both_policies() {
    let mut server =
        SearchServer::with_config(["and"], SearchConfig::default().with_max_results(1000)).unwrap();
    for id in 0..400 {
        let filler = vec!["pad"; 999 + id as usize].join(" ");
        let rating = (id * 7919) % 11 - 5;
        server
            .add_document(id, &format!("x {filler}"), DocumentStatus::Actual, &[rating])
            .unwrap();
    }
    for id in 400..800 {
        server.add_document(id, "y pad", DocumentStatus::Actual, &[1]).unwrap();
    }

    let seq = server
        .find_top_documents_by_status_with(ExecutionPolicy::Sequential, "x", DocumentStatus::Actual)
        .unwrap();
    let par = server
        .find_top_documents_by_status_with(ExecutionPolicy::Parallel, "x", DocumentStatus::Actual)
        .unwrap();
    assert_eq!(seq.len(), 400);
    assert_eq!(seq, par);
    // every neighbouring gap is below epsilon, so the whole list is one rating-ordered run
    assert!(seq.windows(2).all(|w| w[0].rating >= w[1].rating));
}
