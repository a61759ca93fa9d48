//! Output formatting utilities

use crate::error::CliResult;
use colored::*;
use lineage_types::{NodePayloadRecord, Payload};
use serde::Serialize;
use tabled::{Table, Tabled};

const SUMMARY_WIDTH: usize = 48;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Print a vector of items in the specified format
pub fn print_output<T: Serialize + Tabled>(data: Vec<T>, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                println!("{}", "No results".dimmed());
            } else {
                let table = Table::new(data).to_string();
                println!("{}", table);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(&data)?);
        }
    }
    Ok(())
}

/// Print a single item in the specified format
pub fn print_single<T: Serialize>(data: &T, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Table | OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(data)?);
        }
    }
    Ok(())
}

/// Print a warning message to stderr
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message);
}

/// Table row for one node record
#[derive(Debug, Serialize, Tabled)]
pub struct RecordRow {
    address: String,
    kind: String,
    input: String,
    output: String,
    child_execution: String,
}

impl From<&NodePayloadRecord> for RecordRow {
    fn from(r: &NodePayloadRecord) -> Self {
        Self {
            address: r.address.to_string(),
            kind: r.kind.to_string(),
            input: summarize(r.input_payload.as_ref()),
            output: summarize(r.output_payload.as_ref()),
            child_execution: r
                .child_execution
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Short human-readable rendering of a payload
pub fn summarize(payload: Option<&Payload>) -> String {
    let Some(payload) = payload else {
        return "-".to_string();
    };
    let bytes = match payload.data_bytes() {
        Ok(bytes) => bytes,
        Err(_) => return format!("<{} chars, undecodable>", payload.data.len()),
    };

    let text = match serde_json::from_slice::<serde_json::Value>(&bytes) {
        Ok(value) => value.to_string(),
        Err(_) => match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => return format!("<{} bytes>", e.as_bytes().len()),
        },
    };

    if text.chars().count() > SUMMARY_WIDTH {
        let cut: String = text.chars().take(SUMMARY_WIDTH - 3).collect();
        format!("{}...", cut)
    } else {
        text
    }
}
