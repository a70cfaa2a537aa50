use crate::error::SearchError;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;

lazy_static! {
    static ref CONTROL_CHARS: Regex = Regex::new(r"[\x00-\x1F]").expect("valid regex");
}

/// Splits on the space character, skipping empty pieces.
pub fn split_into_words(text: &str) -> impl Iterator<Item = &str> {
    text.split(' ').filter(|word| !word.is_empty())
}

/// A word is valid when it has no C0 control characters.
pub fn is_valid_word(word: &str) -> bool {
    !CONTROL_CHARS.is_match(word)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopWords {
    words: BTreeSet<String>,
}

impl StopWords {
    pub fn new<I, S>(words: I) -> Result<Self, SearchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for word in words {
            let word = word.as_ref();
            if word.is_empty() {
                continue;
            }
            if !is_valid_word(word) {
                return Err(SearchError::InvalidWord(word.to_string()));
            }
            set.insert(word.to_string());
        }
        Ok(Self { words: set })
    }

    pub fn from_text(text: &str) -> Result<Self, SearchError> {
        Self::new(split_into_words(text))
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}

/// Splits a document, validating every word before dropping stop words.
/// Duplicates are kept since they count towards term frequency.
pub fn split_into_words_no_stop<'a>(
    text: &'a str,
    stop_words: &StopWords,
) -> Result<Vec<&'a str>, SearchError> {
    let mut words = Vec::new();
    for word in split_into_words(text) {
        if !is_valid_word(word) {
            return Err(SearchError::InvalidWord(word.to_string()));
        }
        if !stop_words.contains(word) {
            words.push(word);
        }
    }
    Ok(words)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWord<'a> {
    pub text: &'a str,
    pub is_minus: bool,
    pub is_stop: bool,
}

pub fn parse_query_word<'a>(
    token: &'a str,
    stop_words: &StopWords,
) -> Result<QueryWord<'a>, SearchError> {
    if token.is_empty() {
        return Err(SearchError::InvalidQuery(String::new()));
    }
    let (text, is_minus) = match token.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (token, false),
    };
    if text.is_empty() || text.starts_with('-') || !is_valid_word(text) {
        return Err(SearchError::InvalidQuery(token.to_string()));
    }
    Ok(QueryWord { text, is_minus, is_stop: stop_words.contains(text) })
}

/// Required and excluded terms of a query, stop words already discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query<'a> {
    pub plus_words: Vec<&'a str>,
    pub minus_words: Vec<&'a str>,
}

impl Query<'_> {
    /// Sorts both term lists and drops repeats.
    pub fn dedup(&mut self) {
        for words in [&mut self.plus_words, &mut self.minus_words] {
            words.sort_unstable();
            words.dedup();
        }
    }
}

pub fn parse_query<'a>(text: &'a str, stop_words: &StopWords) -> Result<Query<'a>, SearchError> {
    let mut query = Query::default();
    for token in split_into_words(text) {
        let word = parse_query_word(token, stop_words)?;
        if word.is_stop {
            continue;
        }
        if word.is_minus {
            query.minus_words.push(word.text);
        } else {
            query.plus_words.push(word.text);
        }
    }
    Ok(query)
}
