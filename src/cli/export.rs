use super::parse_date;
use crate::core::Ledger;
use crate::core::export::export_csv;
use anyhow::{Context, Result};
use chrono::Local;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// First day to export, YYYY-MM-DD
    #[arg(long)]
    pub start: String,
    /// Last day to export, YYYY-MM-DD
    #[arg(long)]
    pub end: String,
    /// Output file, defaults to export_<start>_<end>.csv
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(ledger: &Ledger, args: ExportArgs) -> Result<PathBuf> {
    let start = parse_date(&args.start)?;
    let end = parse_date(&args.end)?;
    let csv = export_csv(ledger.transactions(), ledger.catalog(), start, end, &Local)?;

    let path = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("export_{start}_{end}.csv")));
    std::fs::write(&path, csv)
        .with_context(|| format!("Failed to write export to {}", path.display()))?;
    info!("Exported transactions to {}", path.display());
    println!("Exported to {}", path.display());
    Ok(path)
}
