//! Result sinks: exported forms of processed documents.

use crate::error::CliError;
use crate::output::render_rows;
use dimex_domain::traits::ResultSink;
use dimex_domain::ProcessedDocument;
use dimex_extractor::{project, COLUMNS};
use std::io::Write;

/// Writes processed documents as a pretty-printed JSON array.
pub struct JsonSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonSink<W> {
    /// Create a sink over `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResultSink for JsonSink<W> {
    type Error = CliError;

    fn write(&mut self, documents: &[ProcessedDocument]) -> Result<(), Self::Error> {
        serde_json::to_writer_pretty(&mut self.writer, documents)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes the tabular projection as a text table.
pub struct TableSink<W: Write> {
    writer: W,
}

impl<W: Write> TableSink<W> {
    /// Create a sink over `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResultSink for TableSink<W> {
    type Error = CliError;

    fn write(&mut self, documents: &[ProcessedDocument]) -> Result<(), Self::Error> {
        writeln!(self.writer, "{}", render_rows(&project(documents)))?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes the tabular projection as CSV under the [`COLUMNS`] headers.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    /// Create a sink over `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
        }
    }

    /// Recover the underlying writer, flushing buffered rows.
    pub fn into_inner(self) -> Result<W, CliError> {
        self.writer
            .into_inner()
            .map_err(|e| CliError::Io(e.into_error()))
    }
}

impl<W: Write> ResultSink for CsvSink<W> {
    type Error = CliError;

    fn write(&mut self, documents: &[ProcessedDocument]) -> Result<(), Self::Error> {
        self.writer.write_record(COLUMNS)?;
        for row in project(documents) {
            self.writer.write_record(row.values())?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
