//! Chunk command implementation.

use crate::cli::ChunkArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::source::AutoTextSource;
use dimex_domain::traits::TextSource;
use dimex_domain::Document;
use dimex_extractor::{Chunker, SourceDocument};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Execute the chunk command.
pub fn execute_chunk(args: ChunkArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let chunker = Chunker::new(
        args.chunk_size.unwrap_or(config.pipeline.chunk_size),
        args.overlap.unwrap_or(config.pipeline.chunk_overlap),
    )?;

    if let Some(dir) = &args.output {
        fs::create_dir_all(dir)?;
    }

    let mut failed = 0;
    for path in &args.files {
        if let Err(e) = chunk_and_write(&chunker, path, args.output.as_deref(), formatter) {
            warn!(path = %path.display(), error = %e, "Chunking failed");
            eprintln!("{}", formatter.error(&format!("{}: {}", path.display(), e)));
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(CliError::InvalidInput(format!(
            "{} of {} files could not be chunked",
            failed,
            args.files.len()
        )));
    }
    Ok(())
}

fn chunk_and_write(
    chunker: &Chunker,
    path: &Path,
    output: Option<&Path>,
    formatter: &Formatter,
) -> Result<()> {
    let document = chunk_file(chunker, path)?;
    println!("{}", formatter.format_chunks(&document)?);

    if let Some(dir) = output {
        let target = dir.join(format!("{}.json", document.doc_id()));
        fs::write(&target, serde_json::to_string_pretty(&document)?)?;
        eprintln!("{}", formatter.success(&format!("Wrote {}", target.display())));
    }
    Ok(())
}

/// Read, extract and chunk one file.
pub fn chunk_file(chunker: &Chunker, path: &Path) -> Result<Document> {
    let source = SourceDocument::from_path(path)?;
    let text = AutoTextSource.extract_text(&source.bytes)?;
    if text.trim().is_empty() {
        return Err(CliError::TextSource(format!(
            "{}: no text found",
            source.filename
        )));
    }

    let document = chunker.chunk(&text, &source.filename);
    info!(doc_id = %document.doc_id(), n_chunks = document.n_chunks(), "Chunked");
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;

    #[test]
    fn test_chunk_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.txt");
        fs::write(&path, "Alpha beta. Gamma delta. Epsilon zeta.").unwrap();

        let document = chunk_file(&Chunker::new(20, 5).unwrap(), &path).unwrap();
        assert_eq!(document.doc_id(), "paper.txt");
        assert_eq!(document.n_chunks(), 3);
        assert_eq!(document.chunks()[0].text, "Alpha beta. ");
    }

    #[test]
    fn test_blank_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.txt");
        fs::write(&path, "  \n\n ").unwrap();

        let result = chunk_file(&Chunker::default(), &path);
        assert!(matches!(result, Err(CliError::TextSource(_))));
    }

    #[test]
    fn test_execute_writes_documents() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        fs::write(&input, "Short paper about warehouse robots.").unwrap();
        let out = dir.path().join("chunks");

        let args = ChunkArgs {
            files: vec![input],
            chunk_size: Some(16),
            overlap: Some(4),
            output: Some(out.clone()),
        };
        let formatter = Formatter::new(OutputFormat::Json, false);
        execute_chunk(args, &Config::default(), &formatter).unwrap();

        let json = fs::read_to_string(out.join("notes.txt.json")).unwrap();
        let document = Document::from_json(&json).unwrap();
        assert!(document.n_chunks() > 1);
    }

    #[test]
    fn test_bad_file_does_not_stop_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.txt");
        fs::write(&good, "A readable paper about supplier risk.").unwrap();
        let out = dir.path().join("chunks");

        let args = ChunkArgs {
            files: vec![dir.path().join("missing.txt"), good],
            chunk_size: None,
            overlap: None,
            output: Some(out.clone()),
        };
        let formatter = Formatter::new(OutputFormat::Json, false);
        let result = execute_chunk(args, &Config::default(), &formatter);

        match result {
            Err(CliError::InvalidInput(message)) => assert!(message.contains("1 of 2")),
            other => panic!("expected a summary error, got {:?}", other),
        }
        assert!(out.join("good.txt.json").exists());
    }

    #[test]
    fn test_invalid_overlap() {
        let args = ChunkArgs {
            files: vec!["unused.txt".into()],
            chunk_size: Some(10),
            overlap: Some(10),
            output: None,
        };
        let formatter = Formatter::new(OutputFormat::Table, false);
        let result = execute_chunk(args, &Config::default(), &formatter);
        assert!(matches!(result, Err(CliError::Extractor(_))));
    }
}
