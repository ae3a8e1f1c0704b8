//! Dimex CLI - Extract research dimensions from papers and score them.

use clap::Parser;
use dimex_cli::commands;
use dimex_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> dimex_cli::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(provider) = cli.provider {
        config.provider.kind = provider.into();
    }
    if let Some(model) = cli.model {
        config.pipeline.model = model;
    }

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Chunk(args) => commands::execute_chunk(args, &config, &formatter)?,
        Command::Extract(args) => commands::execute_extract(args, &config, &formatter).await?,
        Command::Evaluate(args) => commands::execute_evaluate(args, &config, &formatter).await?,
        Command::Export(args) => commands::execute_export(args, &formatter)?,
        Command::Prompt(args) => commands::execute_prompt(args, &config)?,
    }

    Ok(())
}
