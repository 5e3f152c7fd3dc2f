use crate::domain::ports::RunObserver;
use crate::utils::error::{FetchFailure, RowParseError};

/// Production observer: forwards every event to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn fetch_retry(&self, url: &str, attempt: u32, error: &str) {
        tracing::warn!("Attempt {} failed for {}: {}", attempt, url, error);
    }

    fn fetch_failed(&self, year: i32, failure: &FetchFailure) {
        tracing::error!("❌ Failed to get content for year {}: {}", year, failure);
    }

    fn table_selected(&self, year: i32, matcher: &str, table_index: usize) {
        tracing::debug!(
            "Year {}: using table #{} (matched by {})",
            year,
            table_index,
            matcher
        );
    }

    fn table_not_found(&self, year: i32) {
        tracing::warn!("⚠️ No suitable table found for year {}", year);
    }

    fn row_skipped(&self, year: i32, row_index: usize, error: &RowParseError) {
        tracing::debug!("Year {}: skipping row {}: {}", year, row_index, error);
    }

    fn year_extracted(&self, year: i32, records: usize) {
        if records == 0 {
            tracing::warn!("⚠️ No data found for year {}", year);
        } else {
            tracing::info!("✅ Scraped {} records for year {}", records, year);
        }
    }

    fn aggregation_finished(&self, years_with_data: usize, records: usize) {
        if records == 0 {
            tracing::error!("❌ No data was successfully scraped");
        } else {
            tracing::info!(
                "📊 Collected {} records from {} year page(s)",
                records,
                years_with_data
            );
        }
    }
}
