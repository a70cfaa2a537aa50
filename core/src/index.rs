//! Word → document → term frequency, with interned words.
//!
//! Every distinct word is stored once as an `Arc<str>` and addressed by a
//! [`TermId`]. Posting maps live in a slab indexed by that id, so a removal
//! can hand disjoint `&mut` posting maps to parallel workers.

use crate::policy::ExecutionPolicy;
use crate::{DocId, TermId};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

pub type Postings = BTreeMap<DocId, f64>;

#[derive(Debug, Default)]
pub struct InvertedIndex {
    dictionary: HashMap<Arc<str>, TermId>,
    terms: Vec<Option<Arc<str>>>,
    postings: Vec<Postings>,
    free: Vec<TermId>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Number of distinct words currently indexed.
    pub fn len(&self) -> usize {
        self.dictionary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dictionary.is_empty()
    }

    pub fn term_id(&self, word: &str) -> Option<TermId> {
        self.dictionary.get(word).copied()
    }

    pub fn term(&self, id: TermId) -> Option<&Arc<str>> {
        self.terms.get(id as usize).and_then(Option::as_ref)
    }

    pub fn postings(&self, word: &str) -> Option<&Postings> {
        self.term_id(word).map(|id| &self.postings[id as usize])
    }

    /// Number of documents containing `word`.
    pub fn document_frequency(&self, word: &str) -> usize {
        self.postings(word).map_or(0, BTreeMap::len)
    }

    pub fn contains(&self, word: &str, doc_id: DocId) -> bool {
        self.postings(word).is_some_and(|docs| docs.contains_key(&doc_id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &Postings)> {
        self.terms
            .iter()
            .zip(&self.postings)
            .filter_map(|(term, docs)| term.as_ref().map(|term| (term, docs)))
    }

    /// Adds `tf` to the posting of (`word`, `doc_id`) and returns the shared
    /// handle for the word.
    pub fn add_posting(&mut self, word: &str, doc_id: DocId, tf: f64) -> Arc<str> {
        let (id, handle) = self.intern(word);
        *self.postings[id as usize].entry(doc_id).or_insert(0.0) += tf;
        handle
    }

    fn intern(&mut self, word: &str) -> (TermId, Arc<str>) {
        if let Some((handle, &id)) = self.dictionary.get_key_value(word) {
            return (id, Arc::clone(handle));
        }
        let handle: Arc<str> = Arc::from(word);
        let id = match self.free.pop() {
            Some(id) => {
                self.terms[id as usize] = Some(Arc::clone(&handle));
                id
            }
            None => {
                let id = self.terms.len() as TermId;
                self.terms.push(Some(Arc::clone(&handle)));
                self.postings.push(Postings::new());
                id
            }
        };
        self.dictionary.insert(Arc::clone(&handle), id);
        (id, handle)
    }

    fn release(&mut self, id: TermId) {
        if let Some(term) = self.terms[id as usize].take() {
            self.dictionary.remove(&term);
            self.free.push(id);
        }
    }

    /// Drops `doc_id` from the posting maps of `words` and prunes words left
    /// without documents. Each worker owns one posting map.
    pub fn remove_document<'w, I>(&mut self, policy: ExecutionPolicy, doc_id: DocId, words: I)
    where
        I: IntoIterator<Item = &'w str>,
    {
        let mut ids: Vec<TermId> = words.into_iter().filter_map(|w| self.term_id(w)).collect();
        ids.sort_unstable();
        ids.dedup();

        let mut entries = disjoint_slots(&mut self.postings, &ids);
        policy.for_each_mut(&mut entries, |docs| {
            docs.remove(&doc_id);
        });

        for id in ids {
            if self.postings[id as usize].is_empty() {
                self.release(id);
            }
        }
    }
}

/// Mutable references to `slots[i]` for each `i` in `sorted_ids`, which must
/// be strictly increasing.
fn disjoint_slots<'a, T>(slots: &'a mut [T], sorted_ids: &[TermId]) -> Vec<&'a mut T> {
    let mut picked = Vec::with_capacity(sorted_ids.len());
    let mut rest = slots;
    let mut offset = 0usize;
    for &id in sorted_ids {
        let id = id as usize;
        let tail = std::mem::take(&mut rest);
        if id < offset || id - offset >= tail.len() {
            break;
        }
        let (_, tail) = tail.split_at_mut(id - offset);
        let Some((slot, tail)) = tail.split_first_mut() else {
            break;
        };
        picked.push(slot);
        rest = tail;
        offset = id + 1;
    }
    picked
}
