pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{http::HttpFetcher, observer::TracingObserver, storage::LocalStorage};
#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::ReportConfig;
pub use core::{etl::EtlEngine, pipeline::VolumeReportPipeline};
pub use utils::error::{EtlError, Result};
