//! Evaluate command implementation.

use crate::cli::EvaluateArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::provider::AnyProvider;
use dimex_domain::{EvaluatedDocument, RecordDocument};
use dimex_extractor::Evaluator;
use std::fs;
use std::path::Path;

/// Execute the evaluate command.
pub async fn execute_evaluate(args: EvaluateArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let evaluated = run_evaluate(&args, config).await?;
    println!("{}", formatter.format_evaluation(&evaluated)?);

    if let Some(path) = &args.output {
        fs::write(path, serde_json::to_string_pretty(&evaluated)?)?;
        eprintln!("{}", formatter.success(&format!("Wrote {}", path.display())));
    }

    Ok(())
}

/// Score the predicted record against the gold reference.
pub async fn run_evaluate(args: &EvaluateArgs, config: &Config) -> Result<EvaluatedDocument> {
    let predicted = read_record(&args.predicted)?;
    let gold = read_record(&args.gold)?;

    let evaluator = Evaluator::new(AnyProvider::from_config(config)?, config.pipeline.clone());
    Ok(evaluator.evaluate(&predicted, &gold).await?)
}

/// Read a record document; extraction results with a parsed record also fit.
fn read_record(path: &Path) -> Result<RecordDocument> {
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| CliError::InvalidInput(format!("{}: {}", path.display(), e)))
}
