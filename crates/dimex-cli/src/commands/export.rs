//! Export command implementation.

use crate::cli::ExportArgs;
use crate::config::OutputFormat;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::sink::{CsvSink, JsonSink, TableSink};
use dimex_domain::traits::ResultSink;
use dimex_domain::ProcessedDocument;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Execute the export command.
pub fn execute_export(args: ExportArgs, formatter: &Formatter) -> Result<()> {
    let documents = load_results(&args.results)?;

    match &args.output {
        Some(path) => {
            let writer = BufWriter::new(File::create(path)?);
            export(formatter.format(), writer, &documents)?;
            eprintln!(
                "{}",
                formatter.success(&format!(
                    "Exported {} document(s) to {}",
                    documents.len(),
                    path.display()
                ))
            );
        }
        None => export(formatter.format(), io::stdout().lock(), &documents)?,
    }

    Ok(())
}

/// Read a results file written by `extract`.
pub fn load_results(path: &Path) -> Result<Vec<ProcessedDocument>> {
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| CliError::InvalidInput(format!("{}: {}", path.display(), e)))
}

fn export<W: Write>(format: OutputFormat, writer: W, documents: &[ProcessedDocument]) -> Result<()> {
    match format {
        OutputFormat::Json => JsonSink::new(writer).write(documents),
        OutputFormat::Table => TableSink::new(writer).write(documents),
        OutputFormat::Csv => CsvSink::new(writer).write(documents),
    }
}
