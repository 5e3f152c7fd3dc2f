pub mod aggregate;
pub mod etl;
pub mod export;
pub mod extract;
pub mod pipeline;
pub mod reconcile;
pub mod summary;

pub use crate::domain::model::{Report, Series, SummaryStats, VolumeRecord, YoYRecord};
pub use crate::domain::ports::{PageSource, Pipeline, RunObserver, Storage};
pub use crate::utils::error::Result;
pub use aggregate::{AggregateConfig, Aggregator};
pub use etl::EtlEngine;
pub use extract::{ExtractConfig, TableExtractor};
pub use pipeline::VolumeReportPipeline;
pub use reconcile::{MatchPolicy, Reconciler};
