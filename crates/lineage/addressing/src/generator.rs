//! Address generator
//!
//! Scope resolution for an execution, highest priority first:
//!
//! 1. the top of its pushed context stack
//! 2. the parent address it was started with (decoded once)
//! 3. the root scope
//!
//! Counters are kept per `(execution, scope)` and per name, so two root
//! executions never share sequence numbers and replaying one execution
//! reproduces its addresses exactly.

use lineage_types::{context, ActionName, ContextPayload, NodeAddress};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::{debug, warn};

use crate::environment::ExecutionEnvironment;
use crate::error::Result;

/// Counter key: an execution and the scope within it (`None` for root)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ScopeKey {
    pub execution: String,
    pub prefix: Option<NodeAddress>,
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}:{}", self.execution, prefix),
            None => write!(f, "{}:<root>", self.execution),
        }
    }
}

/// Counter values per scope and name
pub type TrackerSnapshot = BTreeMap<ScopeKey, BTreeMap<String, u64>>;

#[derive(Default)]
struct TrackerState {
    counters: HashMap<ScopeKey, HashMap<String, u64>>,
    stacks: HashMap<String, Vec<NodeAddress>>,
    /// Decoded inbound parent per execution; `None` means root
    inbound: HashMap<String, Option<NodeAddress>>,
}

impl TrackerState {
    fn scope_of(&self, execution: &str) -> Option<NodeAddress> {
        self.stacks
            .get(execution)
            .and_then(|stack| stack.last().cloned())
            .or_else(|| self.inbound.get(execution).cloned().flatten())
    }
}

/// Mints node addresses.
#[derive(Default)]
pub struct AddressGenerator {
    state: Mutex<TrackerState>,
}

impl AddressGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint the next address for `name` in the current scope of `execution`.
    pub fn mint(&self, execution: &str, name: &ActionName) -> NodeAddress {
        let mut state = self.state.lock();
        let scope = state.scope_of(execution);

        let key = ScopeKey {
            execution: execution.to_string(),
            prefix: scope.clone(),
        };
        let counter = state
            .counters
            .entry(key)
            .or_default()
            .entry(name.as_str().to_string())
            .or_insert(0);
        *counter += 1;

        let segment = NodeAddress::segment(name, *counter);
        match scope {
            Some(scope) => scope.child(segment.as_str()),
            None => segment,
        }
    }

    /// Mint for the execution the environment reports as current.
    ///
    /// The inbound context is decoded the first time an execution is seen.
    pub fn mint_for(&self, env: &dyn ExecutionEnvironment, name: &ActionName) -> Result<NodeAddress> {
        let execution = env.current_execution_id()?;
        self.ensure_inbound(env, &execution);
        Ok(self.mint(&execution, name))
    }

    fn ensure_inbound(&self, env: &dyn ExecutionEnvironment, execution: &str) {
        if self.state.lock().inbound.contains_key(execution) {
            return;
        }

        let parent = match env.current_execution_context() {
            Some(payload) => decode_inbound(execution, &payload),
            None => {
                debug!(execution, "No inbound context, minting at root scope");
                None
            }
        };

        self.state
            .lock()
            .inbound
            .entry(execution.to_string())
            .or_insert(parent);
    }

    /// Record the context `execution` was started with.
    ///
    /// Returns the decoded parent address; an undecodable payload registers
    /// the root scope.
    pub fn register_inbound(&self, execution: &str, payload: &ContextPayload) -> Option<NodeAddress> {
        let parent = decode_inbound(execution, payload);
        self.state
            .lock()
            .inbound
            .insert(execution.to_string(), parent.clone());
        parent
    }

    /// Enter a nested scope.
    ///
    /// An address that does not already extend the current scope is taken
    /// as relative to it. Returns the scope now in effect.
    pub fn push_context(&self, execution: &str, address: NodeAddress) -> NodeAddress {
        let mut state = self.state.lock();
        let scope = match state.scope_of(execution) {
            Some(current) if address != current && !address.is_within(&current) => {
                current.child(address.as_str())
            }
            _ => address,
        };
        state
            .stacks
            .entry(execution.to_string())
            .or_default()
            .push(scope.clone());
        scope
    }

    /// Leave the innermost pushed scope. No-op on an empty stack.
    pub fn pop_context(&self, execution: &str) -> Option<NodeAddress> {
        let mut state = self.state.lock();
        let stack = state.stacks.get_mut(execution)?;
        let popped = stack.pop();
        if stack.is_empty() {
            state.stacks.remove(execution);
        }
        popped
    }

    /// The scope new addresses in `execution` are minted under
    pub fn current_scope(&self, execution: &str) -> Option<NodeAddress> {
        self.state.lock().scope_of(execution)
    }

    /// Drop all counters, stacks and registered parents.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.counters.clear();
        state.stacks.clear();
        state.inbound.clear();
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        self.state
            .lock()
            .counters
            .iter()
            .map(|(key, names)| {
                let names = names.iter().map(|(n, c)| (n.clone(), *c)).collect();
                (key.clone(), names)
            })
            .collect()
    }
}

fn decode_inbound(execution: &str, payload: &ContextPayload) -> Option<NodeAddress> {
    match context::decode(payload) {
        Ok(parent) => {
            debug!(execution, parent = %parent, "Decoded inbound context");
            Some(parent)
        }
        Err(e) => {
            warn!(execution, error = %e, "Undecodable inbound context, minting at root scope");
            None
        }
    }
}
