//! In-memory TF-IDF search engine with plus/minus query terms.
//!
//! [`SearchServer`] owns the inverted and forward indices. Read operations come
//! in a sequential and a parallel flavour selected through [`ExecutionPolicy`];
//! both produce identical results.

pub mod concurrent_map;
pub mod config;
pub mod corpus;
pub mod dedup;
pub mod document;
pub mod error;
pub mod index;
pub mod log_duration;
pub mod paginator;
pub mod policy;
pub mod request_queue;
pub mod server;
pub mod tokenizer;

pub type DocId = i32;
pub type TermId = u32;

pub use concurrent_map::ConcurrentMap;
pub use config::SearchConfig;
pub use dedup::remove_duplicates;
pub use document::{Document, DocumentStatus};
pub use error::SearchError;
pub use log_duration::LogDuration;
pub use paginator::{paginate, Paginator};
pub use policy::ExecutionPolicy;
pub use request_queue::RequestQueue;
pub use server::SearchServer;
