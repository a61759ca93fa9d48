//! Resolve node addresses against exported histories

use crate::error::{CliError, CliResult};
use crate::output::{self, print_warning, OutputFormat, RecordRow};
use clap::Args;
use lineage_history::DirectoryHistoryStore;
use lineage_resolver::{HistoryResolver, ResolutionReport, ResolverConfig};
use lineage_types::{ExecutionRef, NodeAddress, NodePayloadRecord};
use serde::Serialize;
use std::sync::Arc;

/// Arguments for `lineage resolve`
#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Root execution ID
    #[arg(long)]
    pub execution_id: String,

    /// Root run ID
    #[arg(long)]
    pub run_id: String,

    /// Node addresses to resolve
    #[arg(required = true)]
    pub addresses: Vec<String>,

    /// Report unresolved owners instead of failing
    #[arg(long)]
    pub best_effort: bool,

    /// Replace sub-execution records with the sub-execution's own record
    #[arg(long)]
    pub traverse_children: bool,

    /// Deadline for the whole resolution, in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Serialize)]
struct FailureView {
    owner: String,
    error: String,
    retryable: bool,
    addresses: Vec<NodeAddress>,
}

#[derive(Debug, Serialize)]
struct ResolveOutput {
    payloads: Vec<NodePayloadRecord>,
    failures: Vec<FailureView>,
}

impl From<ResolutionReport> for ResolveOutput {
    fn from(report: ResolutionReport) -> Self {
        Self {
            payloads: report.payloads.into_values().collect(),
            failures: report
                .failures
                .into_iter()
                .map(|(owner, failure)| FailureView {
                    owner: if owner.is_empty() { "<root>".to_string() } else { owner },
                    error: failure.error.to_string(),
                    retryable: failure.error.is_retryable(),
                    addresses: failure.addresses,
                })
                .collect(),
        }
    }
}

/// Execute the resolve command
pub async fn execute(
    args: ResolveArgs,
    store: DirectoryHistoryStore,
    config: &ResolverConfig,
    format: OutputFormat,
) -> CliResult<()> {
    let addresses = parse_addresses(&args.addresses)?;
    let root = ExecutionRef::new(args.execution_id, args.run_id);

    let mut config = config.clone();
    if args.traverse_children {
        config.traverse_child_executions = true;
    }
    if let Some(seconds) = args.timeout {
        config.timeout_seconds = Some(seconds);
    }
    let resolver = HistoryResolver::with_config(Arc::new(store), config);

    let report = if args.best_effort {
        resolver.resolve_best_effort(&addresses, &root).await
    } else {
        let payloads = resolver.resolve(&addresses, &root).await?;
        ResolutionReport {
            payloads,
            ..Default::default()
        }
    };

    let view = ResolveOutput::from(report);
    match format {
        OutputFormat::Table => {
            let rows: Vec<RecordRow> = view.payloads.iter().map(RecordRow::from).collect();
            output::print_output(rows, format)?;
            for failure in &view.failures {
                print_warning(&format!(
                    "{} unresolved under {}: {}",
                    failure.addresses.len(),
                    failure.owner,
                    failure.error
                ));
            }
            Ok(())
        }
        OutputFormat::Json | OutputFormat::Yaml => output::print_single(&view, format),
    }
}

fn parse_addresses(raw: &[String]) -> CliResult<Vec<NodeAddress>> {
    raw.iter()
        .map(|a| {
            let trimmed = a.trim();
            if trimmed.is_empty() {
                Err(CliError::InvalidInput("empty node address".into()))
            } else {
                Ok(NodeAddress::new(trimmed))
            }
        })
        .collect()
}
