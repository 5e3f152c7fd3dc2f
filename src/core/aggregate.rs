use crate::core::extract::TableExtractor;
use crate::domain::model::{Series, VolumeRecord};
use crate::domain::ports::{PageSource, RunObserver};
use crate::utils::error::FetchFailure;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.tsa.gov/travel/passenger-volumes";

#[derive(Debug, Clone)]
pub struct AggregateConfig {
    pub base_url: String,
    /// Year published at the bare base URL. `None` means the last year of the range.
    pub current_year: Option<i32>,
    /// Pause between consecutive year requests.
    pub politeness_delay: Duration,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            current_year: None,
            politeness_delay: Duration::from_secs(1),
        }
    }
}

impl AggregateConfig {
    /// Page URL for `year` in a run ending at `end_year`.
    pub fn url_for(&self, year: i32, end_year: i32) -> String {
        let base = self.base_url.trim_end_matches('/');
        if year == self.current_year.unwrap_or(end_year) {
            base.to_string()
        } else {
            format!("{}/{}", base, year)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YearStatus {
    Collected(usize),
    NoData,
    FetchFailed(FetchFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearOutcome {
    pub year: i32,
    pub url: String,
    pub status: YearStatus,
}

#[derive(Debug, Clone)]
pub struct Aggregation {
    pub series: Series,
    pub years: Vec<YearOutcome>,
}

impl Aggregation {
    pub fn years_with_data(&self) -> usize {
        self.years
            .iter()
            .filter(|y| matches!(y.status, YearStatus::Collected(_)))
            .count()
    }
}

/// Walks a year range one page at a time and merges what each page yields.
pub struct Aggregator<P: PageSource> {
    source: P,
    extractor: TableExtractor,
    config: AggregateConfig,
    observer: Arc<dyn RunObserver>,
}

impl<P: PageSource> Aggregator<P> {
    pub fn new(
        source: P,
        extractor: TableExtractor,
        config: AggregateConfig,
        observer: Arc<dyn RunObserver>,
    ) -> Self {
        Self {
            source,
            extractor,
            config,
            observer,
        }
    }

    /// Sorted, de-duplicated series for `start_year..=end_year`.
    /// Empty when no year produced any data.
    pub async fn aggregate(&self, start_year: i32, end_year: i32) -> Series {
        self.aggregate_detailed(start_year, end_year).await.series
    }

    pub async fn aggregate_detailed(&self, start_year: i32, end_year: i32) -> Aggregation {
        let mut records: Vec<VolumeRecord> = Vec::new();
        let mut years = Vec::new();

        for year in start_year..=end_year {
            if year > start_year && !self.config.politeness_delay.is_zero() {
                tokio::time::sleep(self.config.politeness_delay).await;
            }

            let url = self.config.url_for(year, end_year);
            tracing::info!("🌐 Scraping data for year {} from {}", year, url);

            let status = match self.source.fetch(&url).await {
                Ok(markup) => {
                    let series = self.extractor.extract(&markup, year);
                    self.observer.year_extracted(year, series.len());
                    if series.is_empty() {
                        YearStatus::NoData
                    } else {
                        let count = series.len();
                        records.extend(series.into_records());
                        YearStatus::Collected(count)
                    }
                }
                Err(failure) => {
                    self.observer.fetch_failed(year, &failure);
                    YearStatus::FetchFailed(failure)
                }
            };

            years.push(YearOutcome { year, url, status });
        }

        let aggregation = Aggregation {
            series: Series::from_unsorted(records),
            years,
        };
        self.observer
            .aggregation_finished(aggregation.years_with_data(), aggregation.series.len());
        aggregation
    }
}
