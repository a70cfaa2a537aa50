use crate::document::{Document, DocumentStatus};
use crate::error::SearchError;
use crate::server::SearchServer;
use crate::DocId;
use std::collections::VecDeque;

/// One request is one minute; the queue remembers one day of them.
pub const MINUTES_IN_DAY: u64 = 1440;

#[derive(Debug, Clone, Copy)]
struct QueryResult {
    time: u64,
    empty: bool,
}

/// Records whether recent searches came back empty.
#[derive(Debug, Clone)]
pub struct RequestQueue {
    requests: VecDeque<QueryResult>,
    window: u64,
    current_time: u64,
    no_result_count: usize,
}

impl Default for RequestQueue {
    fn default() -> Self {
        Self::with_window(MINUTES_IN_DAY)
    }
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A window of zero is treated as one request.
    pub fn with_window(window: u64) -> Self {
        Self {
            requests: VecDeque::new(),
            window: window.max(1),
            current_time: 0,
            no_result_count: 0,
        }
    }

    pub fn add_find_request(
        &mut self,
        server: &SearchServer,
        raw_query: &str,
    ) -> Result<Vec<Document>, SearchError> {
        let documents = server.find_top_documents(raw_query)?;
        self.record(&documents);
        Ok(documents)
    }

    pub fn add_find_request_by_status(
        &mut self,
        server: &SearchServer,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>, SearchError> {
        let documents = server.find_top_documents_by_status(raw_query, status)?;
        self.record(&documents);
        Ok(documents)
    }

    pub fn add_find_request_by<P>(
        &mut self,
        server: &SearchServer,
        raw_query: &str,
        predicate: P,
    ) -> Result<Vec<Document>, SearchError>
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool + Sync,
    {
        let documents = server.find_top_documents_by(raw_query, predicate)?;
        self.record(&documents);
        Ok(documents)
    }

    /// Logs one finished search, evicting requests older than the window.
    pub fn record(&mut self, documents: &[Document]) {
        self.current_time += 1;
        while let Some(oldest) = self.requests.front() {
            if self.current_time - oldest.time < self.window {
                break;
            }
            if oldest.empty {
                self.no_result_count -= 1;
            }
            self.requests.pop_front();
        }
        let empty = documents.is_empty();
        if empty {
            self.no_result_count += 1;
        }
        self.requests.push_back(QueryResult { time: self.current_time, empty });
    }

    pub fn no_result_requests(&self) -> usize {
        self.no_result_count
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}
