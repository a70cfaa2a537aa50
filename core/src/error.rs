use crate::DocId;

/// Errors returned by [`crate::SearchServer`] operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// Negative id, or an id that is already indexed.
    #[error("invalid document id: {0}")]
    InvalidId(DocId),
    /// A word contains a control character.
    #[error("word {0:?} is invalid")]
    InvalidWord(String),
    #[error("query word {0:?} is invalid")]
    InvalidQuery(String),
    #[error("document {0} does not exist")]
    UnknownDocument(DocId),
}
