//! Row accumulation and CSV serialization.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::EnrichedRow;

/// Fixed output column header
pub const CSV_HEADER: [&str; 13] = [
    "ID",
    "Question",
    "Answer",
    "Additional Info",
    "Type Code",
    "Obsolete",
    "Fav",
    "Publish Date Timestamp",
    "Publish Date",
    "Author Name",
    "User Tags",
    "Options",
    "Image",
];

/// Collects enriched rows in arrival order and writes them out once enrichment ends.
///
/// Rows are never reordered.
#[derive(Debug, Default)]
pub struct ResultSink {
    rows: Vec<EnrichedRow>,
}

impl ResultSink {
    /// Create a sink with room for `capacity` rows
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: Vec::with_capacity(capacity),
        }
    }

    /// Append a row
    pub fn push(&mut self, row: EnrichedRow) {
        self.rows.push(row);
    }

    /// Number of rows collected
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows have been collected
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in arrival order
    pub fn rows(&self) -> &[EnrichedRow] {
        &self.rows
    }

    /// Serialize header and rows as CSV into `writer`; returns the row count
    pub fn write_csv<W: std::io::Write>(&self, writer: W) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(CSV_HEADER)?;
        for row in &self.rows {
            csv_writer.write_record(csv_fields(row)?)?;
        }
        csv_writer.flush()?;
        Ok(self.rows.len())
    }

    /// Write the CSV file at `path` on a blocking thread, creating parent directories
    pub async fn save(self, path: &Path) -> Result<usize> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || -> Result<usize> {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::File::create(&path)?;
            self.write_csv(std::io::BufWriter::new(file))
        })
        .await
        .map_err(|e| Error::Other(format!("CSV writer task panicked: {}", e)))?
    }
}

/// One row's cells in header order; options are encoded as a JSON array
fn csv_fields(row: &EnrichedRow) -> Result<[String; 13]> {
    let record = row.record();
    Ok([
        record.id.clone(),
        record.question.clone(),
        record.answer.clone(),
        row.additional_info().to_string(),
        record.type_code.clone(),
        record.obsolete.clone(),
        record.fav.clone(),
        record.publish_date.clone(),
        record.publish_date_str.clone(),
        record.author_name.clone(),
        record.user_tags.clone(),
        serde_json::to_string(&row.options().options)?,
        record.image_src.clone(),
    ])
}
