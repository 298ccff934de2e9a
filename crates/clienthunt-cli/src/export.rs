//! CSV export of business records.

use std::fs::File;
use std::io;
use std::path::Path;

use clienthunt_core::BusinessRecord;
use clienthunt_db::BusinessFilter;

/// Upper bound on rows pulled for a single export.
const EXPORT_LIMIT: i64 = 100_000;

pub(crate) const CSV_HEADER: [&str; 11] = [
    "name",
    "contact",
    "address",
    "website",
    "category",
    "location",
    "latitude",
    "longitude",
    "source",
    "scraped_at",
    "data_type",
];

/// Write `records` as CSV (header first) and return how many rows were
/// written. Missing optional fields become empty cells.
///
/// # Errors
///
/// Returns an error if the underlying writer fails.
pub(crate) fn write_records<W: io::Write>(
    writer: W,
    records: &[BusinessRecord],
) -> anyhow::Result<usize> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;

    for record in records {
        let latitude = record.latitude.map(|v| v.to_string()).unwrap_or_default();
        let longitude = record.longitude.map(|v| v.to_string()).unwrap_or_default();
        let scraped_at = record.scraped_at.to_rfc3339();
        csv_writer.write_record([
            record.name.as_str(),
            record.contact.as_deref().unwrap_or(""),
            record.address.as_deref().unwrap_or(""),
            record.website.as_deref().unwrap_or(""),
            record.category.as_str(),
            record.location.as_str(),
            latitude.as_str(),
            longitude.as_str(),
            record.source.as_str(),
            scraped_at.as_str(),
            record.data_type.as_str(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(records.len())
}

/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub(crate) fn write_records_to_path(
    path: &Path,
    records: &[BusinessRecord],
) -> anyhow::Result<usize> {
    let file = File::create(path)
        .map_err(|e| anyhow::anyhow!("failed to create {}: {e}", path.display()))?;
    write_records(file, records)
}

/// Export stored businesses, optionally narrowed by location and category.
///
/// # Errors
///
/// Returns an error if the query fails, a stored row cannot be decoded, or
/// the file cannot be written.
pub(crate) async fn run_export(
    pool: &sqlx::SqlitePool,
    path: &Path,
    location: Option<String>,
    category: Option<String>,
) -> anyhow::Result<()> {
    let filter = BusinessFilter {
        location,
        category,
        limit: Some(EXPORT_LIMIT),
        ..BusinessFilter::default()
    };
    let rows = clienthunt_db::list_businesses(pool, &filter).await?;
    let records = rows
        .into_iter()
        .map(clienthunt_db::BusinessRow::into_record)
        .collect::<Result<Vec<_>, _>>()?;

    let written = write_records_to_path(path, &records)?;
    tracing::info!(written, path = %path.display(), "exported businesses");
    println!("exported {written} businesses to {}", path.display());
    Ok(())
}
