//! Output of harvested listings: the CSV table read by the price model and a
//! JSON crawl report.

use crate::models::ListingRecord;
use crate::scrapers::CrawlReport;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Writes `records` as CSV with a header row, even when there are no records.
pub fn write_csv<W: Write>(records: &[ListingRecord], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(ListingRecord::COLUMNS)?;
    for record in records {
        wtr.write_record(record.as_row())?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn save_csv(records: &[ListingRecord], path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_csv(records, file).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn save_report(report: &CrawlReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
