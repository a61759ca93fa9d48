//! Error types for lineage-types.

use thiserror::Error;

/// Errors raised when building addresses from caller input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Action name cannot be used as an address segment.
    #[error("invalid action name '{name}': {reason}")]
    InvalidName { name: String, reason: String },
}

/// Errors decoding a propagated context payload.
///
/// Receivers treat every variant as "no parent": propagation is best-effort.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// Payload data is not valid base64.
    #[error("context payload is not valid base64: {0}")]
    InvalidBase64(String),

    /// Payload declares json/plain but does not hold a JSON string.
    #[error("context payload is not a JSON string: {0}")]
    InvalidJson(String),

    /// Payload bytes are not UTF-8.
    #[error("context payload is not valid UTF-8")]
    InvalidUtf8,

    /// Encoding metadata names an encoding this codec does not read.
    #[error("unsupported context encoding: {0}")]
    UnsupportedEncoding(String),

    /// Payload decoded to an empty address.
    #[error("context payload carries an empty address")]
    Empty,
}
