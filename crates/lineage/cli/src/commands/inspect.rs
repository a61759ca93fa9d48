//! Inspect one exported history

use crate::error::CliResult;
use crate::output::{self, OutputFormat, RecordRow};
use clap::Args;
use lineage_history::{DirectoryHistoryStore, HistoryFetcher, HistoryFilter};
use lineage_types::{ExecutionRef, NodeAddress};

/// Arguments for `lineage inspect`
#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Execution ID
    #[arg(long)]
    pub execution_id: String,

    /// Run ID
    #[arg(long)]
    pub run_id: String,

    /// Only show these addresses
    #[arg(long = "node")]
    pub nodes: Vec<String>,

    /// Only show addresses at or below this prefix
    #[arg(long = "prefix")]
    pub prefixes: Vec<String>,
}

/// Execute the inspect command
pub async fn execute(
    args: InspectArgs,
    store: &DirectoryHistoryStore,
    format: OutputFormat,
) -> CliResult<()> {
    let execution = ExecutionRef::new(args.execution_id, args.run_id);
    let filter = HistoryFilter {
        node_ids: args.nodes.into_iter().map(NodeAddress::new).collect(),
        prefix_node_ids: args.prefixes.into_iter().map(NodeAddress::new).collect(),
    };

    let log = store.fetch_history(&execution, &filter.node_ids).await?;
    let records = log.node_payloads(&filter);

    match format {
        OutputFormat::Table => {
            if let Some(own) = log.own_address() {
                println!("Execution {} started as {}", execution, own);
            }
            let rows: Vec<RecordRow> = records.values().map(RecordRow::from).collect();
            output::print_output(rows, format)
        }
        OutputFormat::Json | OutputFormat::Yaml => {
            let records: Vec<_> = records.into_values().collect();
            output::print_single(&records, format)
        }
    }
}
