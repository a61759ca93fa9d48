//! Cross-execution payload resolution
//!
//! Given a set of node addresses and the root execution they were minted
//! in, [`HistoryResolver`] finds the execution history that owns each
//! address and extracts the recorded input and output payloads.
//!
//! Ownership follows the address itself: `Root#1.Child#2.Fetch#1` was
//! recorded in the history of the sub-execution `Root#1.Child#2`, which was
//! started from the history of `Root#1`, which was started from the root
//! execution. Resolution walks that chain one history at a time and
//! fetches each history at most once per call.

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod plan;
pub mod resolver;
pub mod session;

pub use config::ResolverConfig;
pub use error::{OwnerFailure, ResolutionFailure, ResolveError};
pub use plan::{owner_key, FetchPlan};
pub use resolver::{HistoryResolver, ResolutionReport, ResolvedPayloads};
pub use session::ResolutionSession;
