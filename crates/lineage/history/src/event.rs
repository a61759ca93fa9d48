//! Typed history events
//!
//! Parses the engine's JSON history export. Each event carries an id, a
//! timestamp, an event type (`EVENT_TYPE_ACTIVITY_TASK_SCHEDULED` or the
//! short `ActivityTaskScheduled` form) and exactly one
//! `*EventAttributes` object. Only the event types that matter for lineage
//! are modelled; everything else is kept as [`EventKind::Other`].
//!
//! Parsing is tolerant: ids may be JSON numbers or strings, payloads
//! without a data field are treated as missing, and an event whose
//! attributes cannot be read degrades to `Other` instead of failing the
//! whole history.

use chrono::{DateTime, Utc};
use lineage_types::{ContextHeaders, ExecutionRef, Payload};
use serde::de::{Deserializer, Error as _};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{HistoryError, Result};

/// One event of an execution history
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEvent {
    pub event_id: Option<i64>,
    pub event_time: Option<DateTime<Utc>>,
    pub kind: EventKind,
}

/// The lineage-relevant event types
#[derive(Clone, Debug, PartialEq)]
pub enum EventKind {
    WorkflowExecutionStarted {
        workflow_type: Option<String>,
        header: ContextHeaders,
        input: Option<Payload>,
    },
    WorkflowExecutionCompleted {
        result: Option<Payload>,
    },
    ActivityTaskScheduled {
        activity_type: Option<String>,
        header: ContextHeaders,
        input: Option<Payload>,
    },
    ActivityTaskCompleted {
        scheduled_event_id: Option<i64>,
        result: Option<Payload>,
    },
    StartChildWorkflowExecutionInitiated {
        workflow_type: Option<String>,
        header: ContextHeaders,
        input: Option<Payload>,
    },
    ChildWorkflowExecutionStarted {
        initiated_event_id: Option<i64>,
        header: ContextHeaders,
        execution: Option<ExecutionRef>,
    },
    ChildWorkflowExecutionCompleted {
        initiated_event_id: Option<i64>,
        result: Option<Payload>,
    },
    Other {
        event_type: String,
    },
}

impl EventKind {
    /// Short event type name, e.g. `ActivityTaskScheduled`
    pub fn name(&self) -> &str {
        match self {
            EventKind::WorkflowExecutionStarted { .. } => "WorkflowExecutionStarted",
            EventKind::WorkflowExecutionCompleted { .. } => "WorkflowExecutionCompleted",
            EventKind::ActivityTaskScheduled { .. } => "ActivityTaskScheduled",
            EventKind::ActivityTaskCompleted { .. } => "ActivityTaskCompleted",
            EventKind::StartChildWorkflowExecutionInitiated { .. } => {
                "StartChildWorkflowExecutionInitiated"
            }
            EventKind::ChildWorkflowExecutionStarted { .. } => "ChildWorkflowExecutionStarted",
            EventKind::ChildWorkflowExecutionCompleted { .. } => {
                "ChildWorkflowExecutionCompleted"
            }
            EventKind::Other { event_type } => event_type,
        }
    }
}

// ── Raw JSON shapes ──────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawAttributes {
    header: RawHeader,
    input: RawPayloads,
    result: RawPayloads,
    #[serde(deserialize_with = "flexible_id")]
    scheduled_event_id: Option<i64>,
    #[serde(deserialize_with = "flexible_id")]
    initiated_event_id: Option<i64>,
    workflow_execution: Option<RawExecution>,
    workflow_type: Option<RawTypeName>,
    activity_type: Option<RawTypeName>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawHeader {
    fields: BTreeMap<String, Value>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawPayloads {
    payloads: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExecution {
    workflow_id: String,
    #[serde(default)]
    run_id: String,
}

#[derive(Deserialize)]
struct RawTypeName {
    name: String,
}

fn flexible_id<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => parse_id(&value)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid event id: {}", value))),
    }
}

fn parse_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// A payload is usable only when it carries a data field
fn parse_payload(value: &Value) -> Option<Payload> {
    value.get("data")?;
    serde_json::from_value(value.clone()).ok()
}

impl RawHeader {
    fn into_headers(self) -> ContextHeaders {
        let mut headers = ContextHeaders::new();
        for (key, value) in self.fields {
            if let Some(payload) = parse_payload(&value) {
                headers.fields.insert(key, payload);
            }
        }
        headers
    }
}

impl RawPayloads {
    fn first(&self) -> Option<Payload> {
        self.payloads.first().and_then(parse_payload)
    }
}

/// Strip the `EVENT_TYPE_` prefix and normalize to `SCREAMING_SNAKE`
fn normalize_event_type(raw: &str) -> String {
    let raw = raw.strip_prefix("EVENT_TYPE_").unwrap_or(raw);
    if raw.contains('_') || raw.chars().all(|c| !c.is_lowercase()) {
        return raw.to_ascii_uppercase();
    }
    let mut out = String::with_capacity(raw.len() + 8);
    for (i, c) in raw.chars().enumerate() {
        if c.is_uppercase() && i > 0 {
            out.push('_');
        }
        out.push(c.to_ascii_uppercase());
    }
    out
}

impl HistoryEvent {
    /// Parse one event object from the JSON export
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| HistoryError::Malformed("event is not an object".into()))?;

        let event_id = object.get("eventId").and_then(parse_id);
        let event_time = object
            .get("eventTime")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc));
        let event_type = object
            .get("eventType")
            .and_then(Value::as_str)
            .unwrap_or_default();

        let attributes = object
            .iter()
            .find(|(key, _)| key.ends_with("EventAttributes"))
            .map(|(_, value)| value.clone())
            .unwrap_or(Value::Null);

        let kind = match serde_json::from_value::<Option<RawAttributes>>(attributes) {
            Ok(raw) => Self::classify(event_type, raw.unwrap_or_default()),
            Err(e) => {
                tracing::warn!(event_id = ?event_id, event_type, error = %e, "Unreadable event attributes");
                EventKind::Other {
                    event_type: event_type.to_string(),
                }
            }
        };

        Ok(Self {
            event_id,
            event_time,
            kind,
        })
    }

    fn classify(event_type: &str, raw: RawAttributes) -> EventKind {
        let input = raw.input.first();
        let result = raw.result.first();
        let workflow_type = raw.workflow_type.map(|t| t.name);

        match normalize_event_type(event_type).as_str() {
            "WORKFLOW_EXECUTION_STARTED" => EventKind::WorkflowExecutionStarted {
                workflow_type,
                header: raw.header.into_headers(),
                input,
            },
            "WORKFLOW_EXECUTION_COMPLETED" => EventKind::WorkflowExecutionCompleted { result },
            "ACTIVITY_TASK_SCHEDULED" => EventKind::ActivityTaskScheduled {
                activity_type: raw.activity_type.map(|t| t.name),
                header: raw.header.into_headers(),
                input,
            },
            "ACTIVITY_TASK_COMPLETED" => EventKind::ActivityTaskCompleted {
                scheduled_event_id: raw.scheduled_event_id,
                result,
            },
            "START_CHILD_WORKFLOW_EXECUTION_INITIATED" | "CHILD_WORKFLOW_EXECUTION_INITIATED" => {
                EventKind::StartChildWorkflowExecutionInitiated {
                    workflow_type,
                    header: raw.header.into_headers(),
                    input,
                }
            }
            "CHILD_WORKFLOW_EXECUTION_STARTED" => EventKind::ChildWorkflowExecutionStarted {
                initiated_event_id: raw.initiated_event_id,
                header: raw.header.into_headers(),
                execution: raw
                    .workflow_execution
                    .map(|e| ExecutionRef::new(e.workflow_id, e.run_id)),
            },
            "CHILD_WORKFLOW_EXECUTION_COMPLETED" => EventKind::ChildWorkflowExecutionCompleted {
                initiated_event_id: raw.initiated_event_id,
                result,
            },
            _ => EventKind::Other {
                event_type: event_type.to_string(),
            },
        }
    }
}
