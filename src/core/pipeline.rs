use crate::config::ReportConfig;
use crate::core::aggregate::Aggregator;
use crate::core::export::ReportExporter;
use crate::core::extract::TableExtractor;
use crate::core::reconcile::Reconciler;
use crate::domain::model::{Report, Series, SummaryStats};
use crate::domain::ports::{PageSource, Pipeline, RunObserver, Storage};
use crate::utils::error::{EtlError, Result};
use chrono::NaiveDate;
use std::sync::Arc;

/// Scrape, reconcile and export one year range.
pub struct VolumeReportPipeline<S: Storage, P: PageSource> {
    aggregator: Aggregator<P>,
    reconciler: Reconciler,
    exporter: ReportExporter<S>,
    start_year: i32,
    end_year: i32,
    run_date: Option<NaiveDate>,
}

impl<S: Storage, P: PageSource> VolumeReportPipeline<S, P> {
    pub fn new(
        storage: S,
        aggregator: Aggregator<P>,
        reconciler: Reconciler,
        start_year: i32,
        end_year: i32,
    ) -> Self {
        Self {
            aggregator,
            reconciler,
            exporter: ReportExporter::new(storage),
            start_year,
            end_year,
            run_date: None,
        }
    }

    pub fn from_config(
        config: &ReportConfig,
        storage: S,
        source: P,
        observer: Arc<dyn RunObserver>,
    ) -> Self {
        let extractor = TableExtractor::new(&config.extract_config(), observer.clone());
        let aggregator = Aggregator::new(source, extractor, config.aggregate_config(), observer);
        Self::new(
            storage,
            aggregator,
            Reconciler::new(config.match_policy()),
            config.range.start_year,
            config.range.end_year,
        )
    }

    /// Pins the date stamped on output files; defaults to today.
    pub fn with_run_date(mut self, run_date: NaiveDate) -> Self {
        self.run_date = Some(run_date);
        self
    }

    fn run_date(&self) -> NaiveDate {
        self.run_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

#[async_trait::async_trait]
impl<S: Storage, P: PageSource> Pipeline for VolumeReportPipeline<S, P> {
    async fn extract(&self) -> Result<Series> {
        let series = self
            .aggregator
            .aggregate(self.start_year, self.end_year)
            .await;

        if series.is_empty() {
            return Err(EtlError::NoData {
                start_year: self.start_year,
                end_year: self.end_year,
            });
        }
        Ok(series)
    }

    async fn transform(&self, series: Series) -> Result<Report> {
        tracing::debug!(
            "Reconciling {} records with {:?}",
            series.len(),
            self.reconciler.policy()
        );
        let yoy = self.reconciler.reconcile(&series);
        let summary = SummaryStats::from_records(&yoy);

        Ok(Report {
            series,
            yoy,
            summary,
            run_date: self.run_date(),
        })
    }

    async fn load(&self, report: Report) -> Result<String> {
        self.exporter.export(&report).await
    }
}
