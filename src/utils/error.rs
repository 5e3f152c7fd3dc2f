use thiserror::Error;

/// A page could not be retrieved after every retry attempt.
///
/// Callers treat this as "no data for this year", never as a fatal condition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to fetch {url} after {attempts} attempt(s): {last_error}")]
pub struct FetchFailure {
    pub url: String,
    pub attempts: u32,
    pub last_error: String,
}

/// Why a single table row was rejected. Never surfaced past the extractor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowParseError {
    #[error("row has {0} cell(s), need at least 2")]
    TooFewCells(usize),

    #[error("unparseable date '{0}'")]
    InvalidDate(String),

    #[error("unparseable volume '{0}'")]
    InvalidVolume(String),
}

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("{0}")]
    Fetch(#[from] FetchFailure),

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field '{field}'")]
    MissingConfigError { field: String },

    #[error("No passenger volume data could be collected for {start_year}-{end_year}")]
    NoData { start_year: i32, end_year: i32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Configuration,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) | EtlError::Fetch(_) => ErrorCategory::Network,
            EtlError::NoData { .. }
            | EtlError::CsvError(_)
            | EtlError::SerializationError(_) => ErrorCategory::Data,
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::IoError(_) | EtlError::ZipError(_) => ErrorCategory::Storage,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 網路問題通常可以重試
            EtlError::ApiError(_) | EtlError::Fetch(_) | EtlError::NoData { .. } => {
                ErrorSeverity::Medium
            }
            EtlError::CsvError(_) | EtlError::SerializationError(_) => ErrorSeverity::High,
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorSeverity::High,
            EtlError::IoError(_) | EtlError::ZipError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check network connectivity and that the source site is reachable, then retry"
            }
            ErrorCategory::Data => match self {
                EtlError::NoData { .. } => {
                    "The source pages may have changed layout or be unavailable; run probe_year against a single year"
                }
                _ => "Inspect the extracted data with --verbose to locate the malformed values",
            },
            ErrorCategory::Configuration => {
                "Review the configuration file and command line flags"
            }
            ErrorCategory::Storage => "Check that the output path exists and is writable",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::NoData {
                start_year,
                end_year,
            } => format!(
                "No data was collected for {}-{}; no report was produced",
                start_year, end_year
            ),
            EtlError::Fetch(failure) => format!("Could not download {}", failure.url),
            EtlError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            EtlError::MissingConfigError { field } => {
                format!("Missing required setting '{}'", field)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
