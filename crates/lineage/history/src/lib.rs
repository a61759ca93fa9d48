//! Execution histories for node lineage
//!
//! An [`EventLog`] is the typed view over one execution's ordered event
//! stream. It indexes the events by the node address propagated in their
//! headers, so that each address maps to the input recorded when the
//! operation was scheduled and the output recorded when it completed.
//!
//! Histories are obtained through the [`HistoryFetcher`] port, which the
//! durable-execution engine's query API implements. Two adapters ship with
//! this crate:
//!
//! - [`InMemoryHistoryStore`]: histories held in memory, with a fetch log
//!   and fault injection for tests
//! - [`DirectoryHistoryStore`]: histories exported as JSON files laid out
//!   as `<root>/<execution_id>/<run_id>.json`

#![deny(unsafe_code)]

pub mod directory;
pub mod error;
pub mod event;
pub mod event_log;
pub mod fetcher;
pub mod memory;

pub use directory::DirectoryHistoryStore;
pub use error::{FetchError, HistoryError, Result};
pub use event::{EventKind, HistoryEvent};
pub use event_log::{EventLog, HistoryFilter};
pub use fetcher::HistoryFetcher;
pub use memory::{FetchCall, InMemoryHistoryStore};
