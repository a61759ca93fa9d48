//! Execution environment port
//!
//! The generator never inspects the engine directly. Whatever runs the
//! orchestration code implements [`ExecutionEnvironment`] to tell it which
//! execution is current, what context that execution was started with,
//! and to receive the root tag of sub-executions it starts.

use lineage_types::ContextPayload;
use parking_lot::Mutex;
use thiserror::Error;

/// Failure to identify the running execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvironmentError {
    #[error("not running inside an execution")]
    NotInExecution,

    #[error("execution environment unavailable: {0}")]
    Unavailable(String),
}

/// What the generator needs to know about the running execution.
pub trait ExecutionEnvironment: Send + Sync {
    /// Identifier of the execution currently running
    fn current_execution_id(&self) -> Result<String, EnvironmentError>;

    /// The context payload the current execution was started with
    fn current_execution_context(&self) -> Option<ContextPayload>;

    /// Record the root workflow name as a searchable tag
    fn upsert_root_tag(&self, name: &str);
}

/// A fixed environment, for tests and in-process harnesses.
#[derive(Debug, Default)]
pub struct FixedEnvironment {
    execution_id: Option<String>,
    context: Option<ContextPayload>,
    root_tags: Mutex<Vec<String>>,
}

impl FixedEnvironment {
    pub fn new(execution_id: impl Into<String>) -> Self {
        Self {
            execution_id: Some(execution_id.into()),
            ..Self::default()
        }
    }

    /// An environment outside any execution
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn with_context(mut self, context: ContextPayload) -> Self {
        self.context = Some(context);
        self
    }

    /// Tags upserted so far, in order
    pub fn root_tags(&self) -> Vec<String> {
        self.root_tags.lock().clone()
    }
}

impl ExecutionEnvironment for FixedEnvironment {
    fn current_execution_id(&self) -> Result<String, EnvironmentError> {
        self.execution_id
            .clone()
            .ok_or(EnvironmentError::NotInExecution)
    }

    fn current_execution_context(&self) -> Option<ContextPayload> {
        self.context.clone()
    }

    fn upsert_root_tag(&self, name: &str) {
        self.root_tags.lock().push(name.to_string());
    }
}
