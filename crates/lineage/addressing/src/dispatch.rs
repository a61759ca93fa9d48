//! Dispatch envelopes
//!
//! A dispatch pairs the caller's arguments with the headers that carry the
//! minted address. The address never travels inside the arguments.

use lineage_types::{root_name, ActionName, ContextHeaders, NodeAddress};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::environment::ExecutionEnvironment;
use crate::error::Result;
use crate::generator::AddressGenerator;
use crate::registry::Action;

/// What a dispatch starts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchKind {
    Activity,
    ChildExecution,
}

impl fmt::Display for DispatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchKind::Activity => write!(f, "activity"),
            DispatchKind::ChildExecution => write!(f, "child_execution"),
        }
    }
}

/// A prepared activity or sub-execution call
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Dispatch<A> {
    pub address: NodeAddress,
    pub kind: DispatchKind,
    pub headers: ContextHeaders,
    pub args: A,
}

impl<A> Dispatch<A> {
    pub fn map_args<B>(self, f: impl FnOnce(A) -> B) -> Dispatch<B> {
        Dispatch {
            address: self.address,
            kind: self.kind,
            headers: self.headers,
            args: f(self.args),
        }
    }
}

fn upsert_root_tag(env: &dyn ExecutionEnvironment, address: &NodeAddress) {
    let tag = root_name(address.as_str());
    if !tag.is_empty() {
        env.upsert_root_tag(tag);
    }
}

impl AddressGenerator {
    /// Mint an address for `action` and wrap `args` with the propagation
    /// headers. Sub-execution dispatches also upsert the root tag.
    pub fn dispatch<A>(
        &self,
        env: &dyn ExecutionEnvironment,
        action: &Action,
        args: A,
    ) -> Result<Dispatch<A>> {
        let address = self.mint_for(env, &action.name)?;
        if action.kind == DispatchKind::ChildExecution {
            upsert_root_tag(env, &address);
        }
        debug!(address = %address, kind = %action.kind, "Prepared dispatch");

        Ok(Dispatch {
            headers: ContextHeaders::for_address(&address),
            address,
            kind: action.kind,
            args,
        })
    }

    /// Enter an in-process sub-execution named `name`.
    ///
    /// Mints its address and pushes it as the current scope until the
    /// returned guard is dropped.
    pub fn enter_child(
        &self,
        env: &dyn ExecutionEnvironment,
        name: &ActionName,
    ) -> Result<ChildScope<'_>> {
        let execution = env.current_execution_id()?;
        let address = self.mint_for(env, name)?;
        upsert_root_tag(env, &address);
        let address = self.push_context(&execution, address);
        Ok(ChildScope {
            generator: self,
            execution,
            address,
        })
    }
}

/// Scope guard returned by [`AddressGenerator::enter_child`]
pub struct ChildScope<'a> {
    generator: &'a AddressGenerator,
    execution: String,
    address: NodeAddress,
}

impl ChildScope<'_> {
    pub fn address(&self) -> &NodeAddress {
        &self.address
    }

    pub fn execution(&self) -> &str {
        &self.execution
    }
}

impl Drop for ChildScope<'_> {
    fn drop(&mut self) {
        self.generator.pop_context(&self.execution);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::FixedEnvironment;
    use crate::registry::ActionRegistry;
    use lineage_types::context;

    #[test]
    fn test_dispatch_carries_headers() {
        let mut registry = ActionRegistry::new();
        let charge = registry.register_activity("Charge").unwrap();
        let tracker = AddressGenerator::new();
        let env = FixedEnvironment::new("order-1");

        let dispatch = tracker.dispatch(&env, &charge, vec![100u32]).unwrap();
        assert_eq!(dispatch.address.as_str(), "Charge#1");
        assert_eq!(dispatch.kind, DispatchKind::Activity);
        assert_eq!(dispatch.args, vec![100]);
        assert_eq!(dispatch.headers.node_address(), Some(dispatch.address.clone()));

        // activities never tag
        assert!(env.root_tags().is_empty());
    }

    #[test]
    fn test_child_dispatch_upserts_root_tag() {
        let mut registry = ActionRegistry::new();
        let fulfil = registry.register_workflow("Fulfil").unwrap();
        let tracker = AddressGenerator::new();
        let env = FixedEnvironment::new("child")
            .with_context(context::encode(&NodeAddress::new("Order#1")));

        let dispatch = tracker.dispatch(&env, &fulfil, ()).unwrap();
        assert_eq!(dispatch.address.as_str(), "Order#1.Fulfil#1");
        assert_eq!(env.root_tags(), vec!["Order".to_string()]);

        let mapped = dispatch.map_args(|()| "payload");
        assert_eq!(mapped.args, "payload");
    }

    #[test]
    fn test_empty_root_tag_not_upserted() {
        let env = FixedEnvironment::new("wf");
        upsert_root_tag(&env, &NodeAddress::new("#1.B#2"));
        assert!(env.root_tags().is_empty());
    }

    #[test]
    fn test_enter_child_scopes_and_pops() {
        let tracker = AddressGenerator::new();
        let env = FixedEnvironment::new("wf");
        let step = ActionName::new("Step").unwrap();

        {
            let scope = tracker
                .enter_child(&env, &ActionName::new("Sub").unwrap())
                .unwrap();
            assert_eq!(scope.address().as_str(), "Sub#1");
            assert_eq!(tracker.mint_for(&env, &step).unwrap().as_str(), "Sub#1.Step#1");
        }

        assert_eq!(tracker.mint_for(&env, &step).unwrap().as_str(), "Step#1");
        assert_eq!(env.root_tags(), vec!["Sub".to_string()]);
    }
}
