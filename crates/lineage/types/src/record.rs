//! Node payload records extracted from an execution history

use crate::{ExecutionRef, NodeAddress, Payload};
use serde::{Deserialize, Serialize};

/// What kind of operation a node address names within one history
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A terminal activity: the payloads recorded here are final
    Activity,
    /// A sub-execution started from this history; its own operations live
    /// in the child's history
    ChildExecution,
    /// The node of the execution that owns this history
    Execution,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            NodeKind::Activity => "activity",
            NodeKind::ChildExecution => "child_execution",
            NodeKind::Execution => "execution",
        };
        write!(f, "{}", label)
    }
}

/// Input and output payloads recorded for one node
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePayloadRecord {
    pub address: NodeAddress,
    pub kind: NodeKind,
    pub input_payload: Option<Payload>,
    pub output_payload: Option<Payload>,
    /// Set for started sub-executions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_execution: Option<ExecutionRef>,
}

impl NodePayloadRecord {
    pub fn new(address: NodeAddress, kind: NodeKind) -> Self {
        Self {
            address,
            kind,
            input_payload: None,
            output_payload: None,
            child_execution: None,
        }
    }

    /// True when the node is a sub-execution whose details live in
    /// another history
    pub fn needs_child_traversal(&self) -> bool {
        self.kind == NodeKind::ChildExecution
    }
}
