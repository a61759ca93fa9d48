//! Node address generation
//!
//! Every orchestrated operation gets an address minted at dispatch time:
//! its name, a per-scope sequence number, and the address of the scope it
//! runs in. Replaying an execution mints the same addresses in the same
//! order, which makes them usable as stable keys into recorded history.
//!
//! The [`AddressGenerator`] owns all tracker state behind one lock. It is
//! created explicitly and shared through `Arc`; there is no global
//! instance.

#![deny(unsafe_code)]

pub mod dispatch;
pub mod environment;
pub mod error;
pub mod generator;
pub mod registry;

pub use dispatch::{ChildScope, Dispatch, DispatchKind};
pub use environment::{EnvironmentError, ExecutionEnvironment, FixedEnvironment};
pub use error::{AddressingError, Result};
pub use generator::{AddressGenerator, ScopeKey, TrackerSnapshot};
pub use lineage_types::root_name;
pub use registry::{Action, ActionRegistry};
