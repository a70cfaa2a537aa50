use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// How a read or removal fans its independent steps out.
///
/// Every engine algorithm is written once against these primitives, so the
/// two variants differ only in scheduling, never in results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionPolicy {
    #[default]
    #[serde(alias = "seq")]
    Sequential,
    #[serde(alias = "par")]
    Parallel,
}

impl ExecutionPolicy {
    pub fn for_each<T, F>(self, items: &[T], f: F)
    where
        T: Sync,
        F: Fn(&T) + Sync + Send,
    {
        match self {
            Self::Sequential => items.iter().for_each(f),
            Self::Parallel => items.par_iter().for_each(f),
        }
    }

    pub fn for_each_mut<T, F>(self, items: &mut [T], f: F)
    where
        T: Send,
        F: Fn(&mut T) + Sync + Send,
    {
        match self {
            Self::Sequential => items.iter_mut().for_each(f),
            Self::Parallel => items.par_iter_mut().for_each(f),
        }
    }

    /// Sequential evaluation stops at the first hit.
    pub fn any<T, F>(self, items: &[T], f: F) -> bool
    where
        T: Sync,
        F: Fn(&T) -> bool + Sync + Send,
    {
        match self {
            Self::Sequential => items.iter().any(f),
            Self::Parallel => items.par_iter().any(f),
        }
    }

    /// Keeps the input order in both modes.
    pub fn filter<T, F>(self, items: &[T], f: F) -> Vec<T>
    where
        T: Clone + Send + Sync,
        F: Fn(&T) -> bool + Sync + Send,
    {
        match self {
            Self::Sequential => items.iter().filter(|item| f(item)).cloned().collect(),
            Self::Parallel => items.par_iter().filter(|item| f(item)).cloned().collect(),
        }
    }

    /// Stable in both modes.
    pub fn sort_by<T, F>(self, items: &mut [T], compare: F)
    where
        T: Send,
        F: Fn(&T, &T) -> Ordering + Sync,
    {
        match self {
            Self::Sequential => items.sort_by(compare),
            Self::Parallel => items.par_sort_by(compare),
        }
    }
}

impl FromStr for ExecutionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "seq" | "sequential" => Ok(Self::Sequential),
            "par" | "parallel" => Ok(Self::Parallel),
            other => Err(format!("unknown execution policy: {other}")),
        }
    }
}
