//! Histories exported to disk as JSON.
//!
//! Layout: `<root>/<execution_id>/<run_id>.json`, each file holding the
//! engine's JSON history export for one run. Ids that are empty, `.` or
//! `..`, or that contain a path separator, have no file: they are never
//! joined onto the root.

use async_trait::async_trait;
use lineage_types::{ExecutionRef, NodeAddress};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

use crate::error::FetchError;
use crate::event_log::EventLog;
use crate::fetcher::HistoryFetcher;

/// Directory-backed history store.
#[derive(Clone, Debug)]
pub struct DirectoryHistoryStore {
    root: PathBuf,
}

impl DirectoryHistoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding the history of `execution`, `None` if either id is not
    /// a plain file name
    pub fn path_for(&self, execution: &ExecutionRef) -> Option<PathBuf> {
        if !is_plain_component(&execution.execution_id) || !is_plain_component(&execution.run_id) {
            return None;
        }
        Some(
            self.root
                .join(&execution.execution_id)
                .join(format!("{}.json", execution.run_id)),
        )
    }

    /// Write a raw history document for `execution`.
    pub async fn store(
        &self,
        execution: &ExecutionRef,
        document: &serde_json::Value,
    ) -> Result<PathBuf, FetchError> {
        let path = self.path_for(execution).ok_or_else(|| FetchError::Io {
            execution: execution.clone(),
            reason: "execution id is not a plain file name".into(),
        })?;
        let io_error = |e: std::io::Error| FetchError::Io {
            execution: execution.clone(),
            reason: e.to_string(),
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        let json = serde_json::to_string_pretty(document).map_err(|e| FetchError::Io {
            execution: execution.clone(),
            reason: e.to_string(),
        })?;
        tokio::fs::write(&path, json).await.map_err(io_error)?;
        Ok(path)
    }
}

fn is_plain_component(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(|c: char| c == '/' || c == '\\' || c == '\0')
}

#[async_trait]
impl HistoryFetcher for DirectoryHistoryStore {
    #[instrument(skip(self, execution, hint_node_ids), fields(execution = %execution))]
    async fn fetch_history(
        &self,
        execution: &ExecutionRef,
        hint_node_ids: &[NodeAddress],
    ) -> Result<EventLog, FetchError> {
        let Some(path) = self.path_for(execution) else {
            warn!("Execution id is not a plain file name, no history to read");
            return Err(FetchError::NotFound(execution.clone()));
        };
        debug!(path = %path.display(), hints = hint_node_ids.len(), "Reading history file");

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FetchError::NotFound(execution.clone()));
            }
            Err(e) => {
                return Err(FetchError::Io {
                    execution: execution.clone(),
                    reason: e.to_string(),
                });
            }
        };

        EventLog::from_json_str(execution.clone(), &contents).map_err(|source| {
            FetchError::Decode {
                execution: execution.clone(),
                source,
            }
        })
    }
}
