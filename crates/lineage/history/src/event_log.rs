//! Indexed execution history
//!
//! The index is built once at construction: every scheduled activity and
//! initiated sub-execution whose header carries a node address becomes a
//! [`NodePayloadRecord`]. Completion events are linked back to their
//! scheduling event through `scheduledEventId` / `initiatedEventId`.

use lineage_types::{ExecutionRef, NodeAddress, NodeKind, NodePayloadRecord, Payload};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::error::{HistoryError, Result};
use crate::event::{EventKind, HistoryEvent};

/// Selects node records from a history.
///
/// An empty filter selects every record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryFilter {
    /// Exact addresses
    #[serde(default)]
    pub node_ids: Vec<NodeAddress>,
    /// Addresses equal to or below any of these
    #[serde(default)]
    pub prefix_node_ids: Vec<NodeAddress>,
}

impl HistoryFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn nodes(node_ids: impl IntoIterator<Item = NodeAddress>) -> Self {
        Self {
            node_ids: node_ids.into_iter().collect(),
            prefix_node_ids: Vec::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: NodeAddress) -> Self {
        self.prefix_node_ids.push(prefix);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty() && self.prefix_node_ids.is_empty()
    }

    pub fn matches(&self, address: &NodeAddress) -> bool {
        if self.is_empty() {
            return true;
        }
        self.node_ids.contains(address)
            || self
                .prefix_node_ids
                .iter()
                .any(|p| address == p || address.is_within(p))
    }
}

/// The ordered event stream of one execution plus its node index
#[derive(Clone, Debug)]
pub struct EventLog {
    execution: ExecutionRef,
    events: Vec<HistoryEvent>,
    nodes: BTreeMap<NodeAddress, NodePayloadRecord>,
    own_address: Option<NodeAddress>,
}

impl EventLog {
    pub fn new(execution: ExecutionRef, events: Vec<HistoryEvent>) -> Self {
        let (nodes, own_address) = index(&events);
        Self {
            execution,
            events,
            nodes,
            own_address,
        }
    }

    /// Parse the engine's JSON export: either `{"events": [...]}` or a bare
    /// event array.
    pub fn from_json(execution: ExecutionRef, document: &Value) -> Result<Self> {
        let raw_events = match document {
            Value::Array(events) => events,
            Value::Object(object) => match object.get("events") {
                Some(Value::Array(events)) => events,
                Some(_) => return Err(HistoryError::Malformed("'events' is not an array".into())),
                None => return Err(HistoryError::Malformed("missing 'events' field".into())),
            },
            _ => {
                return Err(HistoryError::Malformed(
                    "history must be an object or an array".into(),
                ))
            }
        };

        let events = raw_events
            .iter()
            .map(HistoryEvent::from_json)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(execution, events))
    }

    pub fn from_json_str(execution: ExecutionRef, json: &str) -> Result<Self> {
        let document: Value =
            serde_json::from_str(json).map_err(|e| HistoryError::Malformed(e.to_string()))?;
        Self::from_json(execution, &document)
    }

    pub fn execution(&self) -> &ExecutionRef {
        &self.execution
    }

    pub fn events(&self) -> &[HistoryEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Address of the node this execution was started as, read from the
    /// header of its started event. `None` for a root execution.
    pub fn own_address(&self) -> Option<&NodeAddress> {
        self.own_address.as_ref()
    }

    pub fn contains(&self, address: &NodeAddress) -> bool {
        self.nodes.contains_key(address)
    }

    pub fn node_payload(&self, address: &NodeAddress) -> Option<&NodePayloadRecord> {
        self.nodes.get(address)
    }

    pub fn node_input(&self, address: &NodeAddress) -> Option<&Payload> {
        self.nodes.get(address)?.input_payload.as_ref()
    }

    pub fn node_output(&self, address: &NodeAddress) -> Option<&Payload> {
        self.nodes.get(address)?.output_payload.as_ref()
    }

    /// Every indexed record, ordered by address
    pub fn records(&self) -> impl Iterator<Item = &NodePayloadRecord> {
        self.nodes.values()
    }

    /// Records selected by `filter`, keyed by address
    pub fn node_payloads(&self, filter: &HistoryFilter) -> BTreeMap<NodeAddress, NodePayloadRecord> {
        self.nodes
            .iter()
            .filter(|(address, _)| filter.matches(address))
            .map(|(address, record)| (address.clone(), record.clone()))
            .collect()
    }

    /// The concrete execution started for the sub-execution at `address`
    pub fn child_execution(&self, address: &NodeAddress) -> Result<ExecutionRef> {
        let record = self
            .nodes
            .get(address)
            .filter(|r| r.kind == NodeKind::ChildExecution)
            .ok_or_else(|| HistoryError::ChildNotFound {
                address: address.clone(),
                execution: self.execution.clone(),
            })?;

        record
            .child_execution
            .clone()
            .ok_or_else(|| HistoryError::ChildNotStarted {
                address: address.clone(),
                execution: self.execution.clone(),
            })
    }
}

fn open_record(
    nodes: &mut BTreeMap<NodeAddress, NodePayloadRecord>,
    address: &NodeAddress,
    kind: NodeKind,
    input: &Option<Payload>,
) {
    let record = nodes
        .entry(address.clone())
        .or_insert_with(|| NodePayloadRecord::new(address.clone(), kind));
    if record.input_payload.is_none() {
        record.input_payload = input.clone();
    }
}

fn index(events: &[HistoryEvent]) -> (BTreeMap<NodeAddress, NodePayloadRecord>, Option<NodeAddress>) {
    let mut nodes: BTreeMap<NodeAddress, NodePayloadRecord> = BTreeMap::new();
    let mut scheduled: HashMap<i64, NodeAddress> = HashMap::new();
    let mut initiated: HashMap<i64, NodeAddress> = HashMap::new();
    let mut own_address = None;

    for event in events {
        match &event.kind {
            EventKind::WorkflowExecutionStarted { header, input, .. } => {
                if let Some(address) = header.node_address() {
                    open_record(&mut nodes, &address, NodeKind::Execution, input);
                    own_address = Some(address);
                }
            }
            EventKind::WorkflowExecutionCompleted { result } => {
                if let Some(record) = own_address.as_ref().and_then(|a| nodes.get_mut(a)) {
                    record.output_payload = result.clone();
                }
            }
            EventKind::ActivityTaskScheduled { header, input, .. } => {
                if let Some(address) = header.node_address() {
                    open_record(&mut nodes, &address, NodeKind::Activity, input);
                    if let Some(id) = event.event_id {
                        scheduled.insert(id, address);
                    }
                }
            }
            EventKind::ActivityTaskCompleted {
                scheduled_event_id,
                result,
            } => {
                let address = scheduled_event_id.and_then(|id| scheduled.get(&id));
                if let Some(record) = address.and_then(|a| nodes.get_mut(a)) {
                    record.output_payload = result.clone();
                }
            }
            EventKind::StartChildWorkflowExecutionInitiated { header, input, .. } => {
                if let Some(address) = header.node_address() {
                    open_record(&mut nodes, &address, NodeKind::ChildExecution, input);
                    if let Some(id) = event.event_id {
                        initiated.insert(id, address);
                    }
                }
            }
            EventKind::ChildWorkflowExecutionStarted {
                initiated_event_id,
                header,
                execution,
            } => {
                let address = initiated_event_id
                    .and_then(|id| initiated.get(&id).cloned())
                    .or_else(|| header.node_address());
                if let Some(address) = address {
                    let record = nodes.entry(address.clone()).or_insert_with(|| {
                        NodePayloadRecord::new(address.clone(), NodeKind::ChildExecution)
                    });
                    record.child_execution = execution.clone();
                }
            }
            EventKind::ChildWorkflowExecutionCompleted {
                initiated_event_id,
                result,
            } => {
                let address = initiated_event_id.and_then(|id| initiated.get(&id));
                if let Some(record) = address.and_then(|a| nodes.get_mut(a)) {
                    record.output_payload = result.clone();
                }
            }
            EventKind::Other { .. } => {}
        }
    }

    (nodes, own_address)
}
