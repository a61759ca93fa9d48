//! Shared vocabulary for node lineage
//!
//! Every unit of orchestrated work (an activity call or a nested
//! sub-execution) is identified by a hierarchical [`NodeAddress`] such as
//! `Root#1.Child#2.Fetch#1`. This crate defines that address, the
//! [`ExecutionRef`] identifying one concrete run, the opaque [`Payload`]
//! blobs recorded by the engine, and the [`NodePayloadRecord`] extracted
//! from an execution history.
//!
//! It also owns context propagation: the codec that carries a node address
//! across an execution boundary inside a header payload. The same codec is
//! used on dispatch (see `lineage-addressing`) and when reading addresses
//! back out of recorded history (see `lineage-history`).

#![deny(unsafe_code)]

pub mod address;
pub mod context;
pub mod error;
pub mod execution;
pub mod payload;
pub mod record;

pub use address::{root_name, ActionName, NodeAddress, SEGMENT_SEPARATOR, SEQUENCE_MARKER};
pub use context::{ContextHeaders, ContextPayload, NODE_ADDRESS_HEADER};
pub use error::{AddressError, ContextError};
pub use execution::ExecutionRef;
pub use payload::Payload;
pub use record::{NodeKind, NodePayloadRecord};
