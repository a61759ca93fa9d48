//! Resolver integration tests against the in-memory history store.

use async_trait::async_trait;
use lineage_history::{EventLog, FetchError, HistoryFetcher, InMemoryHistoryStore};
use lineage_resolver::{HistoryResolver, ResolveError, ResolverConfig};
use lineage_types::{ContextHeaders, ExecutionRef, NodeAddress, NodeKind, Payload};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

struct HistoryBuilder {
    events: Vec<Value>,
    next_id: i64,
}

fn header(address: &str) -> Value {
    serde_json::to_value(ContextHeaders::for_address(&NodeAddress::new(address))).unwrap()
}

fn payloads(text: &str) -> Value {
    let payload = Payload::from_bytes("json/plain", format!("\"{}\"", text).as_bytes());
    json!({ "payloads": [payload] })
}

impl HistoryBuilder {
    fn new() -> Self {
        Self {
            events: Vec::new(),
            next_id: 1,
        }
    }

    fn push(&mut self, event_type: &str, attributes_key: &str, attributes: Value) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        self.events.push(json!({
            "eventId": id.to_string(),
            "eventTime": "2024-05-01T12:00:00Z",
            "eventType": event_type,
            attributes_key: attributes,
        }));
        id
    }

    fn started_as(mut self, address: &str, input: &str) -> Self {
        self.push(
            "EVENT_TYPE_WORKFLOW_EXECUTION_STARTED",
            "workflowExecutionStartedEventAttributes",
            json!({"header": header(address), "input": payloads(input)}),
        );
        self
    }

    fn activity(mut self, address: &str, input: &str, output: &str) -> Self {
        let scheduled = self.push(
            "EVENT_TYPE_ACTIVITY_TASK_SCHEDULED",
            "activityTaskScheduledEventAttributes",
            json!({"header": header(address), "input": payloads(input)}),
        );
        self.push(
            "EVENT_TYPE_ACTIVITY_TASK_COMPLETED",
            "activityTaskCompletedEventAttributes",
            json!({"scheduledEventId": scheduled.to_string(), "result": payloads(output)}),
        );
        self
    }

    fn child(mut self, address: &str, execution: &ExecutionRef, output: &str) -> Self {
        let initiated = self.push(
            "EVENT_TYPE_START_CHILD_WORKFLOW_EXECUTION_INITIATED",
            "startChildWorkflowExecutionInitiatedEventAttributes",
            json!({"header": header(address), "input": payloads("child-in")}),
        );
        self.push(
            "EVENT_TYPE_CHILD_WORKFLOW_EXECUTION_STARTED",
            "childWorkflowExecutionStartedEventAttributes",
            json!({
                "initiatedEventId": initiated.to_string(),
                "workflowExecution": {
                    "workflowId": execution.execution_id,
                    "runId": execution.run_id,
                }
            }),
        );
        self.push(
            "EVENT_TYPE_CHILD_WORKFLOW_EXECUTION_COMPLETED",
            "childWorkflowExecutionCompletedEventAttributes",
            json!({"initiatedEventId": initiated.to_string(), "result": payloads(output)}),
        );
        self
    }

    fn child_not_started(mut self, address: &str) -> Self {
        self.push(
            "EVENT_TYPE_START_CHILD_WORKFLOW_EXECUTION_INITIATED",
            "startChildWorkflowExecutionInitiatedEventAttributes",
            json!({"header": header(address)}),
        );
        self
    }

    fn completed(mut self, output: &str) -> Self {
        self.push(
            "EVENT_TYPE_WORKFLOW_EXECUTION_COMPLETED",
            "workflowExecutionCompletedEventAttributes",
            json!({"result": payloads(output)}),
        );
        self
    }

    fn build(self, execution: &ExecutionRef) -> EventLog {
        EventLog::from_json(execution.clone(), &json!({ "events": self.events })).unwrap()
    }
}

fn root() -> ExecutionRef {
    ExecutionRef::new("order-7", "run-root")
}

fn root_child() -> ExecutionRef {
    ExecutionRef::new("order-7/Root#1", "run-a")
}

fn grand_child() -> ExecutionRef {
    ExecutionRef::new("order-7/Root#1.Child#1", "run-b")
}

/// root ── act#1
///      └─ Root#1 ── Root#1.act#2
///                └─ Root#1.Child#1 ── Root#1.Child#1.act#1
///                └─ Root#1.Pending#1 (never started)
fn store() -> Arc<InMemoryHistoryStore> {
    let store = InMemoryHistoryStore::new();

    store.insert(
        HistoryBuilder::new()
            .activity("act#1", "a-in", "a-out")
            .child("Root#1", &root_child(), "root-child-out")
            .build(&root()),
    );
    store.insert(
        HistoryBuilder::new()
            .started_as("Root#1", "root-child-in")
            .activity("Root#1.act#2", "b-in", "b-out")
            .child("Root#1.Child#1", &grand_child(), "grand-out")
            .child_not_started("Root#1.Pending#1")
            .completed("root-child-out")
            .build(&root_child()),
    );
    store.insert(
        HistoryBuilder::new()
            .started_as("Root#1.Child#1", "grand-in")
            .activity("Root#1.Child#1.act#1", "c-in", "c-out")
            .completed("grand-out")
            .build(&grand_child()),
    );

    Arc::new(store)
}

fn addrs(list: &[&str]) -> Vec<NodeAddress> {
    list.iter().map(|s| NodeAddress::new(*s)).collect()
}

fn text(payload: &Option<Payload>) -> String {
    let bytes = payload.as_ref().unwrap().data_bytes().unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn each_execution_is_fetched_once() {
    let store = store();
    let resolver = HistoryResolver::new(store.clone());

    let resolved = resolver
        .resolve(&addrs(&["Root#1.Child#1.act#1", "Root#1.act#2"]), &root())
        .await
        .unwrap();

    assert_eq!(resolved.len(), 2);
    assert_eq!(store.fetch_count(&root()), 1);
    assert_eq!(store.fetch_count(&root_child()), 1);
    assert_eq!(store.fetch_count(&grand_child()), 1);

    let leaf = &resolved[&NodeAddress::new("Root#1.Child#1.act#1")];
    assert_eq!(leaf.kind, NodeKind::Activity);
    assert_eq!(text(&leaf.input_payload), "c-in");
    assert_eq!(text(&leaf.output_payload), "c-out");
}

#[tokio::test]
async fn fetch_hints_follow_the_plan() {
    let store = store();
    let resolver = HistoryResolver::new(store.clone());

    resolver
        .resolve(&addrs(&["act#1", "Root#1.Child#1.act#1", "Root#1.act#2"]), &root())
        .await
        .unwrap();

    let log = store.fetch_log();
    let root_call = log.iter().find(|c| c.execution == root()).unwrap();
    assert_eq!(root_call.hint_node_ids, addrs(&["Root#1", "act#1"]));

    let middle = log.iter().find(|c| c.execution == root_child()).unwrap();
    assert_eq!(middle.hint_node_ids, addrs(&["Root#1.Child#1", "Root#1.act#2"]));
}

#[tokio::test]
async fn cold_calls_are_identical() {
    let requested = addrs(&["act#1", "Root#1", "Root#1.act#2", "Root#1.Child#1.act#1"]);

    let first = HistoryResolver::new(store())
        .resolve(&requested, &root())
        .await
        .unwrap();
    let second = HistoryResolver::new(store())
        .resolve(&requested, &root())
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn unknown_addresses_are_absent() {
    let resolver = HistoryResolver::new(store());

    let resolved = resolver
        .resolve(&addrs(&["act#99", "Root#1.nope#1", "act#1"]), &root())
        .await
        .unwrap();

    assert_eq!(resolved.keys().cloned().collect::<Vec<_>>(), addrs(&["act#1"]));
}

#[tokio::test]
async fn empty_request_fetches_nothing() {
    let store = store();
    let resolver = HistoryResolver::new(store.clone());

    assert!(resolver.resolve(&[], &root()).await.unwrap().is_empty());
    assert_eq!(store.total_fetches(), 0);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn deep_fetch_failure_names_prefix() {
    let store = store();
    store.fail_with(
        grand_child(),
        FetchError::Unavailable {
            execution: grand_child(),
            reason: "history shard unavailable".into(),
        },
    );
    let resolver = HistoryResolver::new(store.clone());
    let requested = addrs(&["Root#1.Child#1.act#1", "Root#1.act#2", "act#1"]);

    let failure = resolver.resolve(&requested, &root()).await.unwrap_err();
    match &failure.cause {
        ResolveError::FetchFailed {
            execution, prefix, ..
        } => {
            assert_eq!(execution, &grand_child());
            assert_eq!(prefix.as_ref(), Some(&NodeAddress::new("Root#1.Child#1")));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(failure.cause.is_retryable());
    assert!(failure.partial.contains_key(&NodeAddress::new("Root#1.act#2")));
    assert!(failure.to_string().contains("Root#1.Child#1"));

    let report = resolver.resolve_best_effort(&requested, &root()).await;
    assert!(!report.is_complete());
    assert_eq!(
        report.payloads.keys().cloned().collect::<Vec<_>>(),
        addrs(&["Root#1.act#2", "act#1"])
    );
    let failed = &report.failures["Root#1.Child#1"];
    assert_eq!(failed.addresses, addrs(&["Root#1.Child#1.act#1"]));
    assert_eq!(
        report.unresolved().cloned().collect::<Vec<_>>(),
        addrs(&["Root#1.Child#1.act#1"])
    );
}

#[tokio::test]
async fn unstarted_child_is_unresolved() {
    let resolver = HistoryResolver::new(store());

    let failure = resolver
        .resolve(&addrs(&["Root#1.Pending#1.act#1"]), &root())
        .await
        .unwrap_err();

    assert!(matches!(
        &failure.cause,
        ResolveError::ChildExecutionUnresolved { prefix, parent, .. }
            if prefix.as_str() == "Root#1.Pending#1" && parent == &root_child()
    ));
    assert!(!failure.cause.is_retryable());
    assert!(failure.partial.is_empty());
}

#[tokio::test]
async fn root_failure_reports_no_prefix() {
    let resolver = HistoryResolver::new(Arc::new(InMemoryHistoryStore::new()));

    let failure = resolver
        .resolve(&addrs(&["act#1"]), &root())
        .await
        .unwrap_err();

    assert!(failure.cause.prefix().is_none());
    assert!(matches!(
        failure.cause,
        ResolveError::FetchFailed {
            source: FetchError::NotFound(_),
            ..
        }
    ));
    assert!(failure.cause.is_retryable());
}

#[tokio::test]
async fn first_failing_owner_wins() {
    let store = store();
    store.fail_with(
        grand_child(),
        FetchError::Denied {
            execution: grand_child(),
            reason: "namespace mismatch".into(),
        },
    );
    let resolver = HistoryResolver::new(store);

    let failure = resolver
        .resolve(
            &addrs(&["Root#1.Pending#1.x#1", "Root#1.Child#1.act#1"]),
            &root(),
        )
        .await
        .unwrap_err();

    // "Root#1.Child#1" sorts before "Root#1.Pending#1"
    assert_eq!(
        failure.cause.prefix(),
        Some(&NodeAddress::new("Root#1.Child#1"))
    );
    assert!(matches!(
        &failure.cause,
        ResolveError::FetchFailed {
            source: FetchError::Denied { .. },
            ..
        }
    ));
    assert!(failure.cause.is_retryable());
}

#[tokio::test]
async fn shared_prefix_failure_is_fetched_once() {
    let store = store();
    store.fail_with(
        root_child(),
        FetchError::Unavailable {
            execution: root_child(),
            reason: "history shard unavailable".into(),
        },
    );
    let resolver = HistoryResolver::new(store.clone());
    let requested = addrs(&[
        "Root#1.act#2",
        "Root#1.Child#1.act#1",
        "Root#1.Other#1.x#1",
        "act#1",
    ]);

    let report = resolver.resolve_best_effort(&requested, &root()).await;

    assert_eq!(
        report.failures.keys().cloned().collect::<Vec<_>>(),
        vec!["Root#1", "Root#1.Child#1", "Root#1.Other#1"]
    );
    for failure in report.failures.values() {
        assert_eq!(failure.error.prefix(), Some(&NodeAddress::new("Root#1")));
        assert!(failure.error.is_retryable());
    }
    assert_eq!(report.payloads.keys().cloned().collect::<Vec<_>>(), addrs(&["act#1"]));
    assert_eq!(store.fetch_count(&root()), 1);
    assert_eq!(store.fetch_count(&root_child()), 1);
    assert_eq!(store.fetch_count(&grand_child()), 0);
}

// ---------------------------------------------------------------------------
// Child traversal
// ---------------------------------------------------------------------------

#[tokio::test]
async fn traversal_uses_child_record() {
    let store = store();
    let requested = addrs(&["Root#1", "Root#1.Pending#1"]);

    let shallow = HistoryResolver::new(store.clone())
        .resolve(&requested, &root())
        .await
        .unwrap();
    assert_eq!(shallow[&requested[0]].kind, NodeKind::ChildExecution);
    assert_eq!(text(&shallow[&requested[0]].input_payload), "child-in");

    let config = ResolverConfig::default().with_traversal(true);
    let deep = HistoryResolver::with_config(store.clone(), config)
        .resolve(&requested, &root())
        .await
        .unwrap();

    let own = &deep[&requested[0]];
    assert_eq!(own.kind, NodeKind::Execution);
    assert_eq!(text(&own.input_payload), "root-child-in");
    assert_eq!(text(&own.output_payload), "root-child-out");
    assert_eq!(own.child_execution, Some(root_child()));

    // never started: the parent record is kept
    assert_eq!(deep[&requested[1]].kind, NodeKind::ChildExecution);
    assert_eq!(store.fetch_count(&root_child()), 2);
}

// ---------------------------------------------------------------------------
// Timeouts
// ---------------------------------------------------------------------------

struct SlowFetcher {
    inner: Arc<InMemoryHistoryStore>,
    delay: Duration,
}

#[async_trait]
impl HistoryFetcher for SlowFetcher {
    async fn fetch_history(
        &self,
        execution: &ExecutionRef,
        hint_node_ids: &[NodeAddress],
    ) -> Result<EventLog, FetchError> {
        tokio::time::sleep(self.delay).await;
        self.inner.fetch_history(execution, hint_node_ids).await
    }
}

#[tokio::test(start_paused = true)]
async fn elapsed_timeout_discards_partial_results() {
    let fetcher = Arc::new(SlowFetcher {
        inner: store(),
        delay: Duration::from_secs(30),
    });
    let config = ResolverConfig::default().with_timeout_seconds(5);
    let resolver = HistoryResolver::with_config(fetcher, config);
    let requested = addrs(&["act#1", "Root#1.act#2"]);

    let failure = resolver.resolve(&requested, &root()).await.unwrap_err();
    assert!(matches!(failure.cause, ResolveError::TimedOut(_)));
    assert!(failure.cause.is_retryable());
    assert!(failure.partial.is_empty());

    let report = resolver.resolve_best_effort(&requested, &root()).await;
    assert!(report.payloads.is_empty());
    assert_eq!(report.failures.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn fast_fetches_finish_within_timeout() {
    let fetcher = Arc::new(SlowFetcher {
        inner: store(),
        delay: Duration::from_millis(10),
    });
    let config = ResolverConfig::default().with_timeout_seconds(5);
    let resolver = HistoryResolver::with_config(fetcher, config);

    let resolved = resolver
        .resolve(&addrs(&["Root#1.Child#1.act#1"]), &root())
        .await
        .unwrap();
    assert_eq!(resolved.len(), 1);
}
