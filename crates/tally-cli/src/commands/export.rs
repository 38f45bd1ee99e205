//! Export command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tracing::debug;

use tally_http::{EXPENSES_CSV_FILENAME, summary_pdf_filename};

use crate::output;
use crate::session::SessionContext;

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(subcommand)]
    pub format: ExportFormat,
}

#[derive(Subcommand, Debug)]
pub enum ExportFormat {
    /// Expenses as CSV, optionally for a single month
    Csv {
        /// Month (1-12)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,

        /// Year
        #[arg(long)]
        year: Option<i32>,

        /// Destination file (defaults to expenses.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Monthly summary as PDF
    Pdf {
        /// Month (1-12)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,

        /// Year
        #[arg(long)]
        year: i32,

        /// Destination file (defaults to expense-summary-YYYY-MM.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub async fn run(args: ExportArgs, context: &SessionContext) -> Result<()> {
    let client = context.authenticated_client()?;

    output::progress("Downloading export...");

    let (bytes, path) = match args.format {
        ExportFormat::Csv {
            month,
            year,
            output,
        } => {
            let bytes = client
                .export_expenses_csv(month, year)
                .await
                .context("Failed to export expenses")?;
            (bytes, output.unwrap_or_else(|| EXPENSES_CSV_FILENAME.into()))
        }
        ExportFormat::Pdf {
            month,
            year,
            output,
        } => {
            let bytes = client
                .export_summary_pdf(month, year)
                .await
                .context("Failed to export summary")?;
            (
                bytes,
                output.unwrap_or_else(|| summary_pdf_filename(month, year).into()),
            )
        }
    };

    debug!(path = %path.display(), bytes = bytes.len(), "Writing export");
    std::fs::write(&path, &bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    output::success(&format!("Saved {} bytes to {}", bytes.len(), path.display()));

    Ok(())
}
