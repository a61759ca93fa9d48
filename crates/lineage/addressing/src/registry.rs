//! Registered actions
//!
//! Names are given explicitly when an action is registered and validated
//! once. Minting only ever sees validated names.

use lineage_types::ActionName;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::dispatch::DispatchKind;
use crate::error::{AddressingError, Result};

/// A registered activity or sub-execution type
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Action {
    pub name: ActionName,
    pub kind: DispatchKind,
}

/// Name-to-action table. Activities and sub-executions share one namespace.
#[derive(Clone, Debug, Default)]
pub struct ActionRegistry {
    actions: BTreeMap<String, Action>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_activity(&mut self, name: &str) -> Result<Action> {
        self.register(name, DispatchKind::Activity)
    }

    pub fn register_workflow(&mut self, name: &str) -> Result<Action> {
        self.register(name, DispatchKind::ChildExecution)
    }

    fn register(&mut self, name: &str, kind: DispatchKind) -> Result<Action> {
        let name = ActionName::new(name)?;
        if self.actions.contains_key(name.as_str()) {
            return Err(AddressingError::DuplicateAction(name.to_string()));
        }
        let action = Action { name, kind };
        self.actions
            .insert(action.name.to_string(), action.clone());
        Ok(action)
    }

    pub fn get(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    /// Look up a registered action, failing for unknown names
    pub fn action(&self, name: &str) -> Result<&Action> {
        self.get(name)
            .ok_or_else(|| AddressingError::UnknownAction(name.to_string()))
    }

    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.values()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ActionRegistry::new();
        registry.register_activity("ChargeCard").unwrap();
        registry.register_workflow("Fulfilment").unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.action("ChargeCard").unwrap().kind, DispatchKind::Activity);
        assert_eq!(
            registry.action("Fulfilment").unwrap().kind,
            DispatchKind::ChildExecution
        );
        assert!(matches!(
            registry.action("Refund"),
            Err(AddressingError::UnknownAction(_))
        ));
    }

    #[test]
    fn test_duplicates_rejected_across_kinds() {
        let mut registry = ActionRegistry::new();
        registry.register_activity("Ship").unwrap();
        assert!(matches!(
            registry.register_workflow("Ship"),
            Err(AddressingError::DuplicateAction(_))
        ));
    }

    #[test]
    fn test_invalid_names_rejected() {
        let mut registry = ActionRegistry::new();
        assert!(matches!(
            registry.register_activity("a.b"),
            Err(AddressingError::InvalidName(_))
        ));
        assert!(registry.register_activity("").is_err());
        assert!(registry.is_empty());
    }
}
