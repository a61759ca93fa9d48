//! Resolver configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Upper bound on owner groups resolved concurrently
    pub max_concurrent_fetches: usize,

    /// Deadline for one whole resolve call, in seconds
    pub timeout_seconds: Option<u64>,

    /// Replace sub-execution records with the sub-execution's own record
    pub traverse_child_executions: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 8,
            timeout_seconds: None,
            traverse_child_executions: false,
        }
    }
}

impl ResolverConfig {
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    pub fn with_traversal(mut self, enabled: bool) -> Self {
        self.traverse_child_executions = enabled;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    /// Concurrency limit, never below one
    pub fn concurrency(&self) -> usize {
        self.max_concurrent_fetches.max(1)
    }
}
