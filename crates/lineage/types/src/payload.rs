//! Opaque encoded payloads
//!
//! A payload is carried exactly as the engine recorded it: a metadata map
//! and a data field, both holding base64 text in the engine's JSON history
//! export. Decoding the data is the concern of a separate codec; this crate
//! only reads the encoding marker when it has to (context propagation).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata key naming the payload encoding
pub const ENCODING_KEY: &str = "encoding";

/// Encoded blob attached to an event (input, result or header value)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    pub data: String,
}

impl Payload {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            metadata: BTreeMap::new(),
            data: data.into(),
        }
    }

    /// Build a payload from raw bytes, base64-encoding data and encoding
    pub fn from_bytes(encoding: &str, data: &[u8]) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert(ENCODING_KEY.to_string(), STANDARD.encode(encoding));
        Self {
            metadata,
            data: STANDARD.encode(data),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The declared encoding, if any.
    ///
    /// Metadata values are normally base64; a value that does not decode is
    /// taken verbatim.
    pub fn encoding(&self) -> Option<String> {
        let raw = self.metadata.get(ENCODING_KEY)?;
        match STANDARD.decode(raw) {
            Ok(bytes) => String::from_utf8(bytes).ok().or_else(|| Some(raw.clone())),
            Err(_) => Some(raw.clone()),
        }
    }

    /// Base64-decoded data bytes
    pub fn data_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data)
    }
}
