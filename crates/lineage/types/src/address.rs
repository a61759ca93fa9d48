//! Node addresses: hierarchical identifiers for orchestrated operations
//!
//! Grammar: `Segment ('.' Segment)*` where `Segment = Name '#' Sequence`.
//! The address of an operation nested inside a sub-execution is the
//! sub-execution's address followed by the operation's own segment, so an
//! address doubles as the path through the execution tree that owns it.
//!
//! Construction never validates: addresses read back from recorded history
//! are taken as-is, and every accessor degrades to a best-effort substring
//! on malformed input.

use crate::error::AddressError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Separator between address segments
pub const SEGMENT_SEPARATOR: char = '.';

/// Separator between a segment's name and its sequence number
pub const SEQUENCE_MARKER: char = '#';

// ── Node Address ─────────────────────────────────────────────────────

/// Hierarchical address of one orchestrated operation
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeAddress(String);

impl NodeAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Build a single-segment address `name#sequence`
    pub fn segment(name: &ActionName, sequence: u64) -> Self {
        Self(format!("{}{}{}", name.as_str(), SEQUENCE_MARKER, sequence))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Dotted segments, outermost first
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEGMENT_SEPARATOR)
    }

    /// Number of segments
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// The owner key: this address with its last segment removed.
    ///
    /// `None` for single-segment addresses, which are owned by the root
    /// execution.
    pub fn parent(&self) -> Option<NodeAddress> {
        self.0
            .rsplit_once(SEGMENT_SEPARATOR)
            .map(|(parent, _)| NodeAddress::new(parent))
    }

    /// The last segment (`Fetch#1` for `Root#1.Child#2.Fetch#1`)
    pub fn last_segment(&self) -> &str {
        match self.0.rsplit_once(SEGMENT_SEPARATOR) {
            Some((_, last)) => last,
            None => &self.0,
        }
    }

    /// Name part of the last segment
    pub fn name(&self) -> &str {
        root_name(self.last_segment())
    }

    /// Sequence number of the last segment, if it parses
    pub fn sequence(&self) -> Option<u64> {
        self.last_segment()
            .split_once(SEQUENCE_MARKER)
            .and_then(|(_, seq)| seq.parse().ok())
    }

    /// Append one segment below this address
    pub fn child(&self, segment: &str) -> NodeAddress {
        NodeAddress(format!("{}{}{}", self.0, SEGMENT_SEPARATOR, segment))
    }

    /// The prefix made of the first `depth` segments
    pub fn prefix(&self, depth: usize) -> Option<NodeAddress> {
        if depth == 0 || depth > self.depth() {
            return None;
        }
        let joined = self.segments().take(depth).collect::<Vec<_>>().join(".");
        Some(NodeAddress(joined))
    }

    /// Every dotted prefix of this address, shortest first, ending with the
    /// address itself
    pub fn prefixes(&self) -> Vec<NodeAddress> {
        let mut out = Vec::new();
        let mut current = String::new();
        for segment in self.segments() {
            if !current.is_empty() {
                current.push(SEGMENT_SEPARATOR);
            }
            current.push_str(segment);
            out.push(NodeAddress(current.clone()));
        }
        out
    }

    /// True if this address lies strictly below `scope`
    pub fn is_within(&self, scope: &NodeAddress) -> bool {
        self.0.len() > scope.0.len()
            && self.0.starts_with(&scope.0)
            && self.0[scope.0.len()..].starts_with(SEGMENT_SEPARATOR)
    }

    /// Name of the outermost segment, used as the root workflow tag
    pub fn root_name(&self) -> &str {
        root_name(&self.0)
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeAddress {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NodeAddress {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for NodeAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeAddress {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Substring of `address` before its first `#`.
///
/// Returns the whole string when there is no `#`, and the empty string
/// when `#` is the first character. No grammar validation is performed.
pub fn root_name(address: &str) -> &str {
    match address.find(SEQUENCE_MARKER) {
        Some(idx) => &address[..idx],
        None => address,
    }
}

// ── Action Name ──────────────────────────────────────────────────────

/// Explicit name of an action or sub-execution type.
///
/// Names are given at registration time and must not contain the address
/// separators, otherwise minted addresses would not split back into the
/// segments they were built from.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActionName(String);

impl ActionName {
    pub fn new(name: impl Into<String>) -> Result<Self, AddressError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AddressError::InvalidName {
                name,
                reason: "name is empty".into(),
            });
        }
        if let Some(c) = name
            .chars()
            .find(|c| *c == SEGMENT_SEPARATOR || *c == SEQUENCE_MARKER)
        {
            return Err(AddressError::InvalidName {
                reason: format!("name contains reserved character '{}'", c),
                name,
            });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ActionName {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ActionName> for String {
    fn from(name: ActionName) -> Self {
        name.0
    }
}
