//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Dimex CLI - Extract research dimensions from papers and score them.
#[derive(Debug, Parser)]
#[command(name = "dimex")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DIMEX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Model provider override
    #[arg(long, value_enum, global = true, env = "DIMEX_PROVIDER")]
    pub provider: Option<ProviderArg>,

    /// Model id override
    #[arg(short, long, global = true, env = "DIMEX_MODEL")]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// CSV, one row per document
    Csv,
}

/// Provider options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProviderArg {
    /// Anthropic Messages API
    Anthropic,
    /// Local Ollama server
    Ollama,
    /// Scripted mock responses
    Mock,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Split papers into overlapping chunks
    Chunk(ChunkArgs),

    /// Extract dimension records from papers
    Extract(ExtractArgs),

    /// Score a predicted record against a gold reference
    Evaluate(EvaluateArgs),

    /// Show saved extraction results as a table or JSON
    Export(ExportArgs),

    /// Print the effective system prompt
    Prompt(PromptArgs),
}

/// Arguments for the chunk command.
#[derive(Debug, Parser)]
pub struct ChunkArgs {
    /// Papers to chunk (PDF or plain text)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Chunk size in characters
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Overlap between consecutive chunks
    #[arg(long)]
    pub overlap: Option<usize>,

    /// Directory to write one document JSON per paper
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Papers to process (PDF or plain text)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Instructions placed before the chunks
    #[arg(short, long)]
    pub instructions: Option<String>,

    /// File containing a system prompt override
    #[arg(long)]
    pub system_prompt: Option<PathBuf>,

    /// Maximum documents processed at once
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Write results as JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the evaluate command.
#[derive(Debug, Parser)]
pub struct EvaluateArgs {
    /// Predicted record JSON
    #[arg(short, long)]
    pub predicted: PathBuf,

    /// Gold reference JSON
    #[arg(short, long)]
    pub gold: PathBuf,

    /// Write the evaluated document to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the export command.
#[derive(Debug, Parser)]
pub struct ExportArgs {
    /// Results JSON written by `extract`
    pub results: PathBuf,

    /// Write the export to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the prompt command.
#[derive(Debug, Parser)]
pub struct PromptArgs {
    /// Print the evaluator rubric instead
    #[arg(long)]
    pub evaluator: bool,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Csv => crate::config::OutputFormat::Csv,
        }
    }
}

impl From<ProviderArg> for crate::config::ProviderKind {
    fn from(provider: ProviderArg) -> Self {
        match provider {
            ProviderArg::Anthropic => crate::config::ProviderKind::Anthropic,
            ProviderArg::Ollama => crate::config::ProviderKind::Ollama,
            ProviderArg::Mock => crate::config::ProviderKind::Mock,
        }
    }
}
