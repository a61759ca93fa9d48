//! In-memory history store for development and testing.
//!
//! Records every fetch it serves so tests can assert how often each
//! execution was requested, and can be told to fail specific executions.

use async_trait::async_trait;
use dashmap::DashMap;
use lineage_types::{ExecutionRef, NodeAddress};
use parking_lot::Mutex;

use crate::error::FetchError;
use crate::event_log::EventLog;
use crate::fetcher::HistoryFetcher;

/// One served (or refused) fetch request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchCall {
    pub execution: ExecutionRef,
    pub hint_node_ids: Vec<NodeAddress>,
}

/// In-memory history store.
#[derive(Default)]
pub struct InMemoryHistoryStore {
    histories: DashMap<ExecutionRef, EventLog>,
    failures: DashMap<ExecutionRef, FetchError>,
    calls: Mutex<Vec<FetchCall>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a history under its own execution reference.
    pub fn insert(&self, log: EventLog) {
        self.histories.insert(log.execution().clone(), log);
    }

    /// Make every fetch of `execution` fail with `error`.
    pub fn fail_with(&self, execution: ExecutionRef, error: FetchError) {
        self.failures.insert(execution, error);
    }

    pub fn clear_failure(&self, execution: &ExecutionRef) {
        self.failures.remove(execution);
    }

    /// Every fetch request received, in arrival order
    pub fn fetch_log(&self) -> Vec<FetchCall> {
        self.calls.lock().clone()
    }

    /// Number of fetches received for `execution`
    pub fn fetch_count(&self, execution: &ExecutionRef) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| &c.execution == execution)
            .count()
    }

    pub fn total_fetches(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn reset_fetch_log(&self) {
        self.calls.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }
}

#[async_trait]
impl HistoryFetcher for InMemoryHistoryStore {
    async fn fetch_history(
        &self,
        execution: &ExecutionRef,
        hint_node_ids: &[NodeAddress],
    ) -> Result<EventLog, FetchError> {
        self.calls.lock().push(FetchCall {
            execution: execution.clone(),
            hint_node_ids: hint_node_ids.to_vec(),
        });

        if let Some(error) = self.failures.get(execution) {
            return Err(error.clone());
        }

        self.histories
            .get(execution)
            .map(|log| log.clone())
            .ok_or_else(|| FetchError::NotFound(execution.clone()))
    }
}
