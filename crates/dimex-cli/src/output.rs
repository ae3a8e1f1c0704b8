//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use crate::sink::CsvSink;
use colored::*;
use dimex_domain::traits::ResultSink;
use dimex_domain::{
    Document, EvaluatedDocument, EvaluationOutcome, ExtractionOutcome, ProcessedDocument,
};
use dimex_extractor::{project, BatchReport, DocumentOutcome, TabularRow, COLUMNS};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

const PREVIEW_CHARS: usize = 60;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format processed documents, one row per document.
    pub fn format_documents(&self, documents: &[ProcessedDocument]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(documents)?),
            OutputFormat::Csv => {
                let mut sink = CsvSink::new(Vec::new());
                sink.write(documents)?;
                Ok(String::from_utf8_lossy(&sink.into_inner()?).into_owned())
            }
            OutputFormat::Table => {
                if documents.is_empty() {
                    return Ok(self.colorize("No documents found.", "yellow"));
                }
                Ok(render_rows(&project(documents)))
            }
        }
    }

    /// Format the outcome of a batch run.
    pub fn format_batch(&self, report: &BatchReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => return Ok(serde_json::to_string_pretty(&report.processed())?),
            OutputFormat::Csv => return self.format_documents(&report.processed()),
            OutputFormat::Table => {}
        }
        if report.outcomes.is_empty() {
            return Ok(self.colorize("No documents processed.", "yellow"));
        }

        let mut builder = Builder::default();
        builder.push_record(["Filename", "State", "Detail"]);

        for outcome in &report.outcomes {
            let detail = match outcome {
                DocumentOutcome::Extracted(doc) => doc
                    .analysis
                    .record()
                    .map(|r| format!("{} / {}", r.dcm_capability, r.scor_process))
                    .unwrap_or_default(),
                DocumentOutcome::Degraded(doc) => match &doc.analysis {
                    ExtractionOutcome::Degraded(d) => d.error.clone(),
                    ExtractionOutcome::Parsed(_) => String::new(),
                },
                DocumentOutcome::Failed { error, .. } => error.clone(),
            };
            builder.push_record([
                outcome.filename().to_string(),
                format!("{:?}", outcome.state()),
                preview(&detail, PREVIEW_CHARS),
            ]);
        }

        let summary = format!(
            "{} extracted, {} degraded, {} failed",
            report.extracted_count(),
            report.degraded_count(),
            report.failed_count()
        );
        let summary = if report.failed_count() + report.degraded_count() == 0 {
            self.success(&summary)
        } else {
            self.warning(&summary)
        };

        Ok(format!("{}\n{}", styled(builder), summary))
    }

    /// Format a chunked document. CSV has no chunk layout and falls back to the table.
    pub fn format_chunks(&self, document: &Document) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(document)?),
            OutputFormat::Table | OutputFormat::Csv => {
                if document.n_chunks() == 0 {
                    return Ok(self.colorize(
                        &format!("{}: no text to chunk.", document.doc_id()),
                        "yellow",
                    ));
                }

                let mut builder = Builder::default();
                builder.push_record(["Chunk", "Chars", "Preview"]);
                for chunk in document.chunks() {
                    builder.push_record([
                        chunk.chunk_id.to_string(),
                        chunk.text.chars().count().to_string(),
                        preview(&chunk.text, PREVIEW_CHARS),
                    ]);
                }

                let header = self.info(&format!(
                    "{} ({} chunks)",
                    document.doc_id(),
                    document.n_chunks()
                ));
                Ok(format!("{}\n{}", header, styled(builder)))
            }
        }
    }

    /// Format an evaluated document.
    pub fn format_evaluation(&self, evaluated: &EvaluatedDocument) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(evaluated)?);
        }

        let record = match &evaluated.content {
            EvaluationOutcome::Scored(record) => record,
            EvaluationOutcome::Degraded(degraded) => {
                return Ok(self.warning(&format!("Evaluation degraded: {}", degraded.error)));
            }
        };

        let mut builder = Builder::default();
        builder.push_record(["Field", "Score", "Sub-scores", "Notes"]);
        for (name, field) in &record.fields {
            let subs: Vec<String> = field
                .subdimension_scores
                .iter()
                .map(|(k, v)| format!("{}={:.2}", k, v))
                .collect();
            builder.push_record([
                name.clone(),
                format!("{:.2}", field.score),
                subs.join(", "),
                field.notes.join("; "),
            ]);
        }

        let overall = match record.overall_score {
            Some(score) => self.success(&format!("Overall score: {:.3}", score)),
            None => self.warning("No fields were scored"),
        };
        Ok(format!("{}\n{}", styled(builder), overall))
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Render tabular rows under the standard column headers.
pub fn render_rows(rows: &[TabularRow]) -> String {
    let mut builder = Builder::default();
    builder.push_record(COLUMNS);
    for row in rows {
        builder.push_record(row.values());
    }
    styled(builder)
}

fn styled(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut)
}
