//! History resolver

use futures::stream::{self, StreamExt};
use lineage_history::HistoryFetcher;
use lineage_types::{ExecutionRef, NodeAddress, NodePayloadRecord};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::config::ResolverConfig;
use crate::error::{OwnerFailure, ResolutionFailure, ResolveError};
use crate::plan::FetchPlan;
use crate::session::ResolutionSession;

/// Resolved records keyed by full address
pub type ResolvedPayloads = BTreeMap<NodeAddress, NodePayloadRecord>;

/// Outcome of a best-effort resolve call
#[derive(Debug, Clone, Default)]
pub struct ResolutionReport {
    pub payloads: ResolvedPayloads,
    /// Failed owner groups by owner key (`""` is the root execution)
    pub failures: BTreeMap<String, OwnerFailure>,
}

impl ResolutionReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Every requested address left unresolved by a failure
    pub fn unresolved(&self) -> impl Iterator<Item = &NodeAddress> {
        self.failures.values().flat_map(|f| f.addresses.iter())
    }
}

/// Resolves node addresses to their recorded payloads.
pub struct HistoryResolver {
    fetcher: Arc<dyn HistoryFetcher>,
    config: ResolverConfig,
}

impl HistoryResolver {
    pub fn new(fetcher: Arc<dyn HistoryFetcher>) -> Self {
        Self::with_config(fetcher, ResolverConfig::default())
    }

    pub fn with_config(fetcher: Arc<dyn HistoryFetcher>, config: ResolverConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve every address or fail.
    ///
    /// Addresses with no recorded node are absent from the result. On
    /// failure, the error of the first failing owner (in key order) is
    /// returned together with all payloads that did resolve.
    #[instrument(skip(self, addresses, root), fields(root = %root, requested = addresses.len()))]
    pub async fn resolve(
        &self,
        addresses: &[NodeAddress],
        root: &ExecutionRef,
    ) -> Result<ResolvedPayloads, ResolutionFailure> {
        let mut report = self.run(addresses, root).await;
        match report.failures.pop_first() {
            None => Ok(report.payloads),
            Some((owner, failure)) => {
                warn!(owner = %owner, error = %failure.error, "Resolution failed");
                Err(ResolutionFailure {
                    cause: failure.error,
                    partial: report.payloads,
                })
            }
        }
    }

    /// Resolve what can be resolved and report the rest.
    #[instrument(skip(self, addresses, root), fields(root = %root, requested = addresses.len()))]
    pub async fn resolve_best_effort(
        &self,
        addresses: &[NodeAddress],
        root: &ExecutionRef,
    ) -> ResolutionReport {
        let report = self.run(addresses, root).await;
        for (owner, failure) in &report.failures {
            warn!(
                owner = %owner,
                unresolved = failure.addresses.len(),
                error = %failure.error,
                "Owner group unresolved"
            );
        }
        report
    }

    async fn run(&self, addresses: &[NodeAddress], root: &ExecutionRef) -> ResolutionReport {
        let plan = FetchPlan::new(addresses);
        if plan.is_empty() {
            return ResolutionReport::default();
        }

        let groups = plan.groups.clone();
        info!(owners = groups.len(), "Resolving node payloads");

        let session = ResolutionSession::new(Arc::clone(&self.fetcher), root.clone(), plan);
        let work = self.resolve_groups(&session, groups.clone());

        let report = match self.config.timeout() {
            None => work.await,
            Some(limit) => match tokio::time::timeout(limit, work).await {
                Ok(report) => report,
                Err(_) => {
                    warn!(timeout = ?limit, "Resolution timed out, discarding partial results");
                    return timed_out(limit, groups);
                }
            },
        };

        info!(
            resolved = report.payloads.len(),
            failed_owners = report.failures.len(),
            fetched = session.fetched(),
            "Resolution complete"
        );
        report
    }

    async fn resolve_groups(
        &self,
        session: &ResolutionSession,
        groups: BTreeMap<String, Vec<NodeAddress>>,
    ) -> ResolutionReport {
        let outcomes: Vec<_> = stream::iter(groups)
            .map(|(owner, addresses)| async move {
                let result = self.resolve_group(session, &owner, &addresses).await;
                (owner, addresses, result)
            })
            .buffer_unordered(self.config.concurrency())
            .collect()
            .await;

        let mut report = ResolutionReport::default();
        for (owner, addresses, result) in outcomes {
            match result {
                Ok(payloads) => report.payloads.extend(payloads),
                Err(error) => {
                    report
                        .failures
                        .insert(owner, OwnerFailure { error, addresses });
                }
            }
        }
        report
    }

    async fn resolve_group(
        &self,
        session: &ResolutionSession,
        owner: &str,
        addresses: &[NodeAddress],
    ) -> Result<ResolvedPayloads, ResolveError> {
        let log = if owner.is_empty() {
            session.root_log().await?
        } else {
            session.log_for(&NodeAddress::new(owner), addresses).await?
        };

        let mut resolved = ResolvedPayloads::new();
        for address in addresses {
            let Some(record) = log.node_payload(address) else {
                debug!(address = %address, execution = %log.execution(), "Address not recorded");
                continue;
            };

            let record = if self.config.traverse_child_executions && record.needs_child_traversal() {
                self.traverse(session, record).await?
            } else {
                record.clone()
            };
            resolved.insert(address.clone(), record);
        }
        Ok(resolved)
    }

    /// Swap a sub-execution record for the record the sub-execution keeps
    /// of itself. A sub-execution that never started keeps its record.
    async fn traverse(
        &self,
        session: &ResolutionSession,
        record: &NodePayloadRecord,
    ) -> Result<NodePayloadRecord, ResolveError> {
        let child = session
            .log_for(&record.address, std::slice::from_ref(&record.address))
            .await;

        match child {
            Ok(log) => Ok(log
                .node_payload(&record.address)
                .cloned()
                .map(|mut own| {
                    own.child_execution = record.child_execution.clone();
                    own
                })
                .unwrap_or_else(|| record.clone())),
            Err(ResolveError::ChildExecutionUnresolved { .. }) => {
                debug!(address = %record.address, "Child execution not started, keeping parent record");
                Ok(record.clone())
            }
            Err(e) => Err(e),
        }
    }
}

fn timed_out(limit: std::time::Duration, groups: BTreeMap<String, Vec<NodeAddress>>) -> ResolutionReport {
    ResolutionReport {
        payloads: ResolvedPayloads::new(),
        failures: groups
            .into_iter()
            .map(|(owner, addresses)| {
                let failure = OwnerFailure {
                    error: ResolveError::TimedOut(limit),
                    addresses,
                };
                (owner, failure)
            })
            .collect(),
    }
}
