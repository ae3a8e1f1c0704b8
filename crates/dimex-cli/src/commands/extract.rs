//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use crate::provider::AnyProvider;
use crate::sink::JsonSink;
use crate::source::AutoTextSource;
use dimex_domain::traits::ResultSink;
use dimex_domain::DocumentState;
use dimex_extractor::{BatchDriver, BatchReport, DimensionExtractor, DocumentOutcome, SourceDocument};
use std::fs::{self, File};
use std::io::BufWriter;
use tracing::warn;

/// Execute the extract command.
pub async fn execute_extract(args: ExtractArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let report = run_extract(&args, config).await?;
    println!("{}", formatter.format_batch(&report)?);

    if let Some(path) = &args.output {
        let mut sink = JsonSink::new(BufWriter::new(File::create(path)?));
        sink.write(&report.processed())?;
        eprintln!(
            "{}",
            formatter.success(&format!(
                "Wrote {} result(s) to {}",
                report.extracted_count() + report.degraded_count(),
                path.display()
            ))
        );
    }

    Ok(())
}

/// Chunk and extract every input file, keeping the input order.
///
/// Files that cannot be read are reported as failed documents alongside the
/// others rather than aborting the batch.
pub async fn run_extract(args: &ExtractArgs, config: &Config) -> Result<BatchReport> {
    let mut pipeline = config.pipeline.clone();
    if let Some(instructions) = &args.instructions {
        pipeline.instructions = instructions.clone();
    }
    if let Some(path) = &args.system_prompt {
        pipeline.system_prompt = Some(fs::read_to_string(path)?);
    }
    if let Some(jobs) = args.jobs {
        pipeline.max_concurrent_documents = jobs;
    }

    let provider = AnyProvider::from_config(config)?;
    let driver = BatchDriver::new(DimensionExtractor::new(provider, pipeline))?;

    let reads: Vec<_> = args
        .files
        .iter()
        .map(|path| SourceDocument::from_path(path).map_err(|e| (path.display().to_string(), e)))
        .collect();
    let readable: Vec<SourceDocument> = reads.iter().filter_map(|r| r.as_ref().ok().cloned()).collect();

    let mut extracted = driver.run(&AutoTextSource, readable).await.outcomes.into_iter();
    let mut outcomes = Vec::with_capacity(reads.len());
    for read in reads {
        match read {
            Ok(_) => {
                if let Some(outcome) = extracted.next() {
                    outcomes.push(outcome);
                }
            }
            Err((filename, error)) => {
                warn!(filename = %filename, error = %error, "Could not read input");
                outcomes.push(DocumentOutcome::Failed {
                    filename,
                    state: DocumentState::Raw,
                    error: error.to_string(),
                });
            }
        }
    }

    Ok(BatchReport { outcomes })
}
