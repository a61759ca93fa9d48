//! Error types for lineage-resolver.

use lineage_history::{FetchError, HistoryError};
use lineage_types::{ExecutionRef, NodeAddress};
use std::time::Duration;
use thiserror::Error;

use crate::resolver::ResolvedPayloads;

fn display_prefix(prefix: &Option<NodeAddress>) -> &str {
    prefix.as_ref().map(NodeAddress::as_str).unwrap_or("<root>")
}

/// Why an owner group could not be resolved.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// The parent history does not record the start of this sub-execution.
    #[error("child execution '{prefix}' is not resolvable from history of {parent}: {source}")]
    ChildExecutionUnresolved {
        prefix: NodeAddress,
        parent: ExecutionRef,
        #[source]
        source: HistoryError,
    },

    /// The history of an execution on the path could not be fetched.
    #[error("failed to fetch history of {execution} at {}: {source}", display_prefix(.prefix))]
    FetchFailed {
        execution: ExecutionRef,
        /// `None` for the root execution
        prefix: Option<NodeAddress>,
        #[source]
        source: FetchError,
    },

    #[error("resolution timed out after {0:?}")]
    TimedOut(Duration),
}

impl ResolveError {
    /// The sub-execution prefix the failure occurred at, `None` for root
    pub fn prefix(&self) -> Option<&NodeAddress> {
        match self {
            ResolveError::ChildExecutionUnresolved { prefix, .. } => Some(prefix),
            ResolveError::FetchFailed { prefix, .. } => prefix.as_ref(),
            ResolveError::TimedOut(_) => None,
        }
    }

    /// Fetcher failures and timeouts are retryable; an unresolved child is
    /// not until its parent history records the start.
    pub fn is_retryable(&self) -> bool {
        match self {
            ResolveError::ChildExecutionUnresolved { .. } => false,
            ResolveError::FetchFailed { .. } | ResolveError::TimedOut(_) => true,
        }
    }
}

/// A failed resolve call, with everything resolved before the failure.
#[derive(Debug, Error)]
#[error("resolution failed: {cause}")]
pub struct ResolutionFailure {
    pub cause: ResolveError,
    pub partial: ResolvedPayloads,
}

/// One owner group that could not be resolved
#[derive(Debug, Clone)]
pub struct OwnerFailure {
    pub error: ResolveError,
    /// Requested addresses left unresolved
    pub addresses: Vec<NodeAddress>,
}
