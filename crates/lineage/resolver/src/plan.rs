//! Fetch planning
//!
//! Requested addresses are grouped by owner, and for every history on the
//! way down the set of nodes the resolver will read from it is collected up
//! front. That set is sent as the fetch hint, so each history is asked for
//! everything it has to provide in one request.

use lineage_types::NodeAddress;
use std::collections::{BTreeMap, BTreeSet};

/// Owner key of an address: its parent, or the empty string for root
pub fn owner_key(address: &NodeAddress) -> String {
    address.parent().map(NodeAddress::into_string).unwrap_or_default()
}

/// Owner groups and per-history fetch hints for one resolve call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchPlan {
    /// Requested addresses by owner key (`""` is the root execution)
    pub groups: BTreeMap<String, Vec<NodeAddress>>,
    /// Nodes each history must provide, keyed like `groups`
    pub batches: BTreeMap<String, Vec<NodeAddress>>,
}

impl FetchPlan {
    pub fn new<'a>(addresses: impl IntoIterator<Item = &'a NodeAddress>) -> Self {
        let unique: BTreeSet<&NodeAddress> = addresses.into_iter().collect();

        let mut groups: BTreeMap<String, Vec<NodeAddress>> = BTreeMap::new();
        let mut batches: BTreeMap<String, BTreeSet<NodeAddress>> = BTreeMap::new();

        for address in unique {
            groups
                .entry(owner_key(address))
                .or_default()
                .push(address.clone());

            // each history on the path provides its immediate child prefix
            let mut owner = String::new();
            for prefix in address.prefixes() {
                batches.entry(owner).or_default().insert(prefix.clone());
                owner = prefix.into_string();
            }
        }

        Self {
            groups,
            batches: batches
                .into_iter()
                .map(|(owner, nodes)| (owner, nodes.into_iter().collect()))
                .collect(),
        }
    }

    /// Fetch hint for the history at `prefix`.
    ///
    /// Falls back to `fallback` for histories the plan did not anticipate.
    pub fn hints_for(&self, prefix: &str, fallback: &[NodeAddress]) -> Vec<NodeAddress> {
        self.batches
            .get(prefix)
            .cloned()
            .unwrap_or_else(|| fallback.to_vec())
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
