use crate::policy::ExecutionPolicy;
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    #[serde(alias = "ACTUAL")]
    Actual,
    #[serde(alias = "IRRELEVANT")]
    Irrelevant,
    #[serde(alias = "BANNED")]
    Banned,
    #[serde(alias = "REMOVED")]
    Removed,
}

impl FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "actual" => Ok(Self::Actual),
            "irrelevant" => Ok(Self::Irrelevant),
            "banned" => Ok(Self::Banned),
            "removed" => Ok(Self::Removed),
            other => Err(format!("unknown document status: {other}")),
        }
    }
}

/// A ranked query hit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub relevance: f64,
    pub rating: i32,
}

impl Document {
    pub fn new(id: DocId, relevance: f64, rating: i32) -> Self {
        Self { id, relevance, rating }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ document_id = {}, relevance = {}, rating = {} }}",
            self.id, self.relevance, self.rating
        )
    }
}

/// Sorts hits into ranking order: higher relevance first, and within a run of
/// hits whose neighbouring relevances differ by less than `epsilon`, higher
/// rating first.
///
/// The epsilon tie is not transitive, so it is never handed to a sort as a
/// comparator. Hits are sorted by the total relevance order, each near-tie run
/// is found by a linear scan and then sorted by rating.
pub fn rank_documents(policy: ExecutionPolicy, documents: &mut [Document], epsilon: f64) {
    policy.sort_by(documents, |lhs, rhs| rhs.relevance.total_cmp(&lhs.relevance));

    let mut start = 0;
    while start < documents.len() {
        let mut end = start + 1;
        while end < documents.len()
            && (documents[end - 1].relevance - documents[end].relevance).abs() < epsilon
        {
            end += 1;
        }
        if end - start > 1 {
            documents[start..end].sort_by(|lhs, rhs| {
                rhs.rating
                    .cmp(&lhs.rating)
                    .then_with(|| rhs.relevance.total_cmp(&lhs.relevance))
            });
        }
        start = end;
    }
}
