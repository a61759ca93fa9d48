//! Property tests: minted sequence numbers are dense, unique and replayable.

use lineage_addressing::{AddressGenerator, FixedEnvironment};
use lineage_types::{ActionName, NodeAddress};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::thread;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

fn arb_names(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![Just("Fetch"), Just("Store"), Just("Notify"), Just("Audit")],
        1..max,
    )
    .prop_map(|names| names.into_iter().map(String::from).collect())
}

fn arb_scope() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[A-Z][a-z]{1,6}#[1-9](\\.[A-Z][a-z]{1,6}#[1-9]){0,2}")
}

fn mint_all(tracker: &AddressGenerator, scope: &Option<String>, names: &[String]) -> Vec<NodeAddress> {
    if let Some(scope) = scope {
        tracker.push_context("wf", NodeAddress::new(scope.as_str()));
    }
    names
        .iter()
        .map(|n| tracker.mint("wf", &ActionName::new(n.as_str()).unwrap()))
        .collect()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    /// For every name, the k-th mint in a scope carries sequence k.
    #[test]
    fn sequences_are_dense_per_name(scope in arb_scope(), names in arb_names(40)) {
        let tracker = AddressGenerator::new();
        let minted = mint_all(&tracker, &scope, &names);

        let mut seen: BTreeMap<&str, u64> = BTreeMap::new();
        for (name, address) in names.iter().zip(&minted) {
            let expected = seen.entry(name.as_str()).or_insert(0);
            *expected += 1;
            prop_assert_eq!(address.name(), name.as_str());
            prop_assert_eq!(address.sequence(), Some(*expected));
            prop_assert_eq!(address.parent().map(|p| p.into_string()), scope.clone());
        }
    }

    /// Addresses minted in one scope never repeat.
    #[test]
    fn minted_addresses_are_unique(scope in arb_scope(), names in arb_names(60)) {
        let tracker = AddressGenerator::new();
        let minted = mint_all(&tracker, &scope, &names);
        let unique: HashSet<_> = minted.iter().collect();
        prop_assert_eq!(unique.len(), minted.len());
    }

    /// A reset tracker replays the same sequence of addresses.
    #[test]
    fn replay_after_reset_is_identical(scope in arb_scope(), names in arb_names(30)) {
        let tracker = AddressGenerator::new();
        let first = mint_all(&tracker, &scope, &names);
        tracker.reset();
        let second = mint_all(&tracker, &scope, &names);
        prop_assert_eq!(first, second);
    }
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn concurrent_mints_in_one_scope_are_distinct() {
    let tracker = Arc::new(AddressGenerator::new());
    let env = Arc::new(FixedEnvironment::new("wf"));
    let name = ActionName::new("Work").unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let tracker = Arc::clone(&tracker);
            let env = Arc::clone(&env);
            let name = name.clone();
            thread::spawn(move || {
                (0..250)
                    .map(|_| tracker.mint_for(env.as_ref(), &name).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut all = HashSet::new();
    for handle in handles {
        for address in handle.join().unwrap() {
            assert!(all.insert(address), "duplicate address minted");
        }
    }

    assert_eq!(all.len(), 2000);
    assert!(all.contains(&NodeAddress::new("Work#2000")));
    assert!(!all.contains(&NodeAddress::new("Work#2001")));
}
