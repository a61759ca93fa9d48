//! Execution references

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one concrete, already-started execution (root or child)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExecutionRef {
    /// Durable execution identifier (the engine's workflow id)
    pub execution_id: String,
    /// Identifier of the specific run of that execution
    pub run_id: String,
}

impl ExecutionRef {
    pub fn new(execution_id: impl Into<String>, run_id: impl Into<String>) -> Self {
        Self {
            execution_id: execution_id.into(),
            run_id: run_id.into(),
        }
    }
}

impl fmt::Display for ExecutionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.execution_id, self.run_id)
    }
}
