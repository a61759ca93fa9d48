//! Context propagation across execution boundaries
//!
//! When an operation is dispatched, the address minted for it travels
//! out-of-band in a header payload rather than in the argument list. The
//! receiving execution decodes it once and uses it as the parent scope for
//! every address it mints.
//!
//! The payload shape follows the engine's own payload converter: the
//! address is serialized as a JSON string and stored base64-encoded with a
//! `json/plain` encoding marker.

use crate::error::ContextError;
use crate::{NodeAddress, Payload};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Header key carrying the node address
pub const NODE_ADDRESS_HEADER: &str = "node_id";

pub const ENCODING_JSON_PLAIN: &str = "json/plain";
pub const ENCODING_BINARY_PLAIN: &str = "binary/plain";

/// A header value carrying a propagated address
pub type ContextPayload = Payload;

/// Encode an address for propagation
pub fn encode(address: &NodeAddress) -> ContextPayload {
    // serializing a &str into JSON cannot fail
    let json = serde_json::Value::String(address.as_str().to_string()).to_string();
    Payload::from_bytes(ENCODING_JSON_PLAIN, json.as_bytes())
}

/// Decode a propagated address
pub fn decode(payload: &ContextPayload) -> Result<NodeAddress, ContextError> {
    let bytes = payload
        .data_bytes()
        .map_err(|e| ContextError::InvalidBase64(e.to_string()))?;

    let address = match payload.encoding().as_deref() {
        None | Some(ENCODING_JSON_PLAIN) => serde_json::from_slice::<String>(&bytes)
            .map_err(|e| ContextError::InvalidJson(e.to_string()))?,
        Some(ENCODING_BINARY_PLAIN) => {
            String::from_utf8(bytes).map_err(|_| ContextError::InvalidUtf8)?
        }
        Some(other) => return Err(ContextError::UnsupportedEncoding(other.to_string())),
    };

    if address.is_empty() {
        return Err(ContextError::Empty);
    }
    Ok(NodeAddress::new(address))
}

// ── Headers ──────────────────────────────────────────────────────────

/// Typed out-of-band header map attached to a dispatched operation.
///
/// Serializes as `{"fields": {...}}`, the shape headers take in recorded
/// history.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextHeaders {
    #[serde(default)]
    pub fields: BTreeMap<String, ContextPayload>,
}

impl ContextHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Headers carrying only the given address
    pub fn for_address(address: &NodeAddress) -> Self {
        let mut headers = Self::new();
        headers.set_node_address(address);
        headers
    }

    pub fn set_node_address(&mut self, address: &NodeAddress) {
        self.fields
            .insert(NODE_ADDRESS_HEADER.to_string(), encode(address));
    }

    /// Raw node address payload, if present
    pub fn node_address_payload(&self) -> Option<&ContextPayload> {
        self.fields.get(NODE_ADDRESS_HEADER)
    }

    /// Decoded node address; `None` when absent or undecodable
    pub fn node_address(&self) -> Option<NodeAddress> {
        self.node_address_payload().and_then(|p| decode(p).ok())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let addr = NodeAddress::new("Parent#1.Child#3");
        let payload = encode(&addr);
        assert_eq!(payload.encoding().as_deref(), Some(ENCODING_JSON_PLAIN));
        assert_eq!(decode(&payload).unwrap(), addr);
    }

    #[test]
    fn test_decode_engine_payload() {
        // "\"Child#1\"" with json/plain, as exported by the engine
        let payload = Payload::new("IkNoaWxkIzEi").with_metadata("encoding", "anNvbi9wbGFpbg==");
        assert_eq!(decode(&payload).unwrap(), NodeAddress::new("Child#1"));
    }

    #[test]
    fn test_decode_binary_plain() {
        let payload = Payload::from_bytes(ENCODING_BINARY_PLAIN, b"A#1.b#2");
        assert_eq!(decode(&payload).unwrap(), NodeAddress::new("A#1.b#2"));
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            decode(&Payload::new("!!not base64!!")),
            Err(ContextError::InvalidBase64(_))
        ));
        assert!(matches!(
            decode(&Payload::from_bytes(ENCODING_JSON_PLAIN, b"{}")),
            Err(ContextError::InvalidJson(_))
        ));
        assert!(matches!(
            decode(&Payload::from_bytes("binary/protobuf", b"x")),
            Err(ContextError::UnsupportedEncoding(_))
        ));
        assert!(matches!(
            decode(&Payload::from_bytes(ENCODING_JSON_PLAIN, b"\"\"")),
            Err(ContextError::Empty)
        ));
    }

    #[test]
    fn test_headers_serde_shape() {
        let headers = ContextHeaders::for_address(&NodeAddress::new("a#1"));
        let value = serde_json::to_value(&headers).unwrap();
        assert!(value["fields"][NODE_ADDRESS_HEADER]["data"].is_string());

        let back: ContextHeaders = serde_json::from_value(value).unwrap();
        assert_eq!(back.node_address(), Some(NodeAddress::new("a#1")));
        assert!(ContextHeaders::new().node_address().is_none());
    }
}
