use crate::core::batch::partition_rows;
use crate::domain::model::CustomerBatch;
use crate::utils::error::{MergeError, Result};

/// Parses the customers CSV. The first row is the header; rows may be ragged.
pub fn read_customers(data: &[u8], source: &str, id_field: &str) -> Result<CustomerBatch> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut rows = reader
        .records()
        .map(|row| row.map(|row| row.iter().map(str::to_string).collect::<Vec<_>>()))
        .collect::<std::result::Result<Vec<_>, csv::Error>>()?
        .into_iter();

    let header = rows.next().ok_or_else(|| MergeError::EmptyRecordSource {
        path: source.to_string(),
    })?;

    let batch = partition_rows(header, rows.collect(), id_field)?;
    tracing::info!(
        "📥 Read {} customers from {} ({} rejected)",
        batch.records.len(),
        source,
        batch.rejected_rows.len()
    );
    Ok(batch)
}

/// Serializes error report rows (header first) as CSV.
pub fn write_error_report(rows: &[Vec<String>]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| MergeError::IoError(std::io::Error::new(e.error().kind(), e.to_string())))
}
