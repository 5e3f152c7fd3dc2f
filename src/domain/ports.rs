use crate::domain::model::{Report, Series};
use crate::utils::error::{FetchFailure, Result, RowParseError};
use async_trait::async_trait;
use std::sync::Arc;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Location of `path` as reported to the user.
    fn location(&self, path: &str) -> String;
}

/// Anything that can hand back the markup behind a URL.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> std::result::Result<String, FetchFailure>;
}

#[async_trait]
impl<T: PageSource + ?Sized> PageSource for Arc<T> {
    async fn fetch(&self, url: &str) -> std::result::Result<String, FetchFailure> {
        (**self).fetch(url).await
    }
}

/// Receives the notable events of a run.
///
/// Every method has an empty default so test observers only implement what
/// they assert on.
pub trait RunObserver: Send + Sync {
    fn fetch_retry(&self, _url: &str, _attempt: u32, _error: &str) {}
    fn fetch_failed(&self, _year: i32, _failure: &FetchFailure) {}
    fn table_selected(&self, _year: i32, _matcher: &str, _table_index: usize) {}
    fn table_not_found(&self, _year: i32) {}
    fn row_skipped(&self, _year: i32, _row_index: usize, _error: &RowParseError) {}
    fn year_extracted(&self, _year: i32, _records: usize) {}
    fn aggregation_finished(&self, _years_with_data: usize, _records: usize) {}
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Series>;
    async fn transform(&self, series: Series) -> Result<Report>;
    async fn load(&self, report: Report) -> Result<String>;
}
