//! Error types for lineage-addressing.

use lineage_types::AddressError;
use thiserror::Error;

use crate::environment::EnvironmentError;

/// Errors from address generation and dispatch preparation.
#[derive(Debug, Clone, Error)]
pub enum AddressingError {
    /// The running execution could not be identified.
    #[error("cannot determine current execution: {0}")]
    ExecutionIdentity(#[from] EnvironmentError),

    #[error("action '{0}' is already registered")]
    DuplicateAction(String),

    #[error("action '{0}' is not registered")]
    UnknownAction(String),

    #[error(transparent)]
    InvalidName(#[from] AddressError),
}

/// Result type for addressing operations.
pub type Result<T> = std::result::Result<T, AddressingError>;
