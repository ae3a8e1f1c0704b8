//! Flat, one-row-per-document view of processed documents

use dimex_domain::ProcessedDocument;
use serde::Serialize;

/// Column headers, in display order
pub const COLUMNS: [&str; 9] = [
    "Filename",
    "Timestamp",
    "N_Chunks",
    "DCM Capability",
    "SCOR Process",
    "SCRM Area",
    "Problem Description",
    "AI Technology Nature",
    "Industry Sector",
];

/// One row of the tabular view; absent values are blank
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TabularRow {
    /// Uploaded filename
    pub filename: String,
    /// Chunking time, RFC 3339
    pub timestamp: String,
    /// Number of chunks
    pub n_chunks: String,
    /// DCM capability
    pub dcm_capability: String,
    /// SCOR process
    pub scor_process: String,
    /// SCRM area
    pub scrm_area: String,
    /// Problem description
    pub problem_description: String,
    /// AI technology nature
    pub ai_technology_nature: String,
    /// Industry sector
    pub industry_sector: String,
}

impl TabularRow {
    /// Cell values in [`COLUMNS`] order
    pub fn values(&self) -> [&str; 9] {
        [
            self.filename.as_str(),
            self.timestamp.as_str(),
            self.n_chunks.as_str(),
            self.dcm_capability.as_str(),
            self.scor_process.as_str(),
            self.scrm_area.as_str(),
            self.problem_description.as_str(),
            self.ai_technology_nature.as_str(),
            self.industry_sector.as_str(),
        ]
    }
}

impl From<&ProcessedDocument> for TabularRow {
    fn from(doc: &ProcessedDocument) -> Self {
        let mut row = TabularRow {
            filename: doc.filename.clone(),
            ..TabularRow::default()
        };

        if let Some(source) = &doc.metadata.source {
            row.timestamp = source.timestamp.to_rfc3339();
            row.n_chunks = source.n_chunks.to_string();
        }

        if let Some(record) = doc.analysis.record() {
            row.dcm_capability = record.dcm_capability.clone();
            row.scor_process = record.scor_process.clone();
            row.scrm_area = record.scrm_area.clone().unwrap_or_default();
            row.problem_description = record.problem_description.clone();
            row.ai_technology_nature = record.ai_technology_nature.clone();
            row.industry_sector = record.industry_sector.clone();
        }

        row
    }
}

/// Project processed documents to rows, keeping their order
pub fn project(documents: &[ProcessedDocument]) -> Vec<TabularRow> {
    documents.iter().map(TabularRow::from).collect()
}
