//! Error types for lineage-history.

use lineage_types::{ExecutionRef, NodeAddress};
use thiserror::Error;

/// Errors reading or querying an execution history.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// The history document does not have the expected shape.
    #[error("malformed history: {0}")]
    Malformed(String),

    /// No node with this address was started from the history.
    #[error("no child execution '{address}' recorded in history of {execution}")]
    ChildNotFound {
        address: NodeAddress,
        execution: ExecutionRef,
    },

    /// The node exists but its execution has not been recorded as started.
    #[error("child execution '{address}' has not started in history of {execution}")]
    ChildNotStarted {
        address: NodeAddress,
        execution: ExecutionRef,
    },
}

/// Errors returned by a [`HistoryFetcher`](crate::HistoryFetcher).
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The engine has no history for this execution.
    #[error("history not found for {0}")]
    NotFound(ExecutionRef),

    /// The history service could not serve the request.
    #[error("history service unavailable for {execution}: {reason}")]
    Unavailable {
        execution: ExecutionRef,
        reason: String,
    },

    /// The history service refused the request.
    #[error("access to history of {execution} denied: {reason}")]
    Denied {
        execution: ExecutionRef,
        reason: String,
    },

    /// The history was served but could not be read.
    #[error("history of {execution} could not be decoded: {source}")]
    Decode {
        execution: ExecutionRef,
        #[source]
        source: HistoryError,
    },

    /// Local storage failure.
    #[error("I/O error reading history of {execution}: {reason}")]
    Io {
        execution: ExecutionRef,
        reason: String,
    },
}

impl FetchError {
    /// The execution the failed request targeted
    pub fn execution(&self) -> &ExecutionRef {
        match self {
            FetchError::NotFound(execution)
            | FetchError::Unavailable { execution, .. }
            | FetchError::Denied { execution, .. }
            | FetchError::Decode { execution, .. }
            | FetchError::Io { execution, .. } => execution,
        }
    }

    /// Whether retrying the same request may succeed.
    ///
    /// Only a served history that could not be decoded is permanent; a
    /// missing, refused or unreachable history may be served later.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::Decode { .. })
    }
}

/// Result type for history operations.
pub type Result<T> = std::result::Result<T, HistoryError>;
