use crate::domain::model::{Report, Series, SummaryStats, YoYRecord};
use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const VOLUMES_FILE: &str = "volumes.csv";
pub const YOY_FILE: &str = "yoy.csv";
pub const SUMMARY_FILE: &str = "summary.json";

const VOLUME_HEADERS: [&str; 3] = ["date", "passenger_volume", "year"];
const YOY_HEADERS: [&str; 7] = [
    "date",
    "passenger_volume",
    "year",
    "prior_date",
    "prior_volume",
    "yoy_ratio",
    "yoy_percentage",
];

pub fn bundle_name(run_date: NaiveDate) -> String {
    format!("passenger_volume_report_{}.zip", run_date.format("%Y%m%d"))
}

pub fn raw_csv_name(run_date: NaiveDate) -> String {
    format!("passenger_volumes_{}.csv", run_date.format("%Y%m%d"))
}

// Header row is written by hand so an empty table still carries it.
fn to_csv<'a, T, I>(headers: &[&str], rows: I) -> Result<Vec<u8>>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}

pub fn volumes_csv(series: &Series) -> Result<Vec<u8>> {
    to_csv(&VOLUME_HEADERS, series)
}

/// Absent comparisons become empty cells.
pub fn yoy_csv(records: &[YoYRecord]) -> Result<Vec<u8>> {
    to_csv(&YOY_HEADERS, records)
}

pub fn summary_json(summary: &SummaryStats) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(summary)?)
}

/// Zip archive holding the volume table, the YoY table and, when present,
/// the summary.
pub fn build_bundle(report: &Report) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    zip.start_file::<_, ()>(VOLUMES_FILE, FileOptions::default())?;
    zip.write_all(&volumes_csv(&report.series)?)?;

    zip.start_file::<_, ()>(YOY_FILE, FileOptions::default())?;
    zip.write_all(&yoy_csv(&report.yoy)?)?;

    if let Some(summary) = &report.summary {
        zip.start_file::<_, ()>(SUMMARY_FILE, FileOptions::default())?;
        zip.write_all(&summary_json(summary)?)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// Writes a report's files through a [`Storage`] backend.
pub struct ReportExporter<S: Storage> {
    storage: S,
}

impl<S: Storage> ReportExporter<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Writes the bundle and the raw data CSV; returns the bundle location.
    pub async fn export(&self, report: &Report) -> Result<String> {
        let bundle = bundle_name(report.run_date);
        let raw_csv = raw_csv_name(report.run_date);

        let zip_data = build_bundle(report)?;
        tracing::debug!("Writing report bundle ({} bytes) to {}", zip_data.len(), bundle);
        self.storage.write_file(&bundle, &zip_data).await?;

        let csv_data = volumes_csv(&report.series)?;
        self.storage.write_file(&raw_csv, &csv_data).await?;

        tracing::info!(
            "💾 Data saved to {}",
            self.storage.location(&raw_csv)
        );
        Ok(self.storage.location(&bundle))
    }
}
