use crate::adapters::http::{FetchConfig, DEFAULT_USER_AGENT};
use crate::core::aggregate::{AggregateConfig, DEFAULT_BASE_URL};
use crate::core::extract::{ExtractConfig, DEFAULT_HEADER_KEYWORDS};
use crate::core::reconcile::{MatchPolicy, DEFAULT_WINDOW_DAYS};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const MIN_YEAR: i32 = 2000;
pub const MAX_YEAR: i32 = 2100;
pub const MAX_WINDOW_DAYS: u32 = 15;

// Safety: the pattern is a compile-time literal.
static ENV_VAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

/// Full run configuration, loadable from TOML. Every field has a default so
/// an empty file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub source: SourceSection,
    pub range: RangeSection,
    pub extract: ExtractSection,
    pub reconcile: ReconcileSection,
    pub load: LoadSection,
    pub monitoring: MonitoringSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    pub base_url: String,
    /// Year served at the bare base URL; defaults to `range.end_year`.
    pub current_year: Option<i32>,
    pub retry_attempts: u32,
    pub retry_delay_seconds: u64,
    pub timeout_seconds: u64,
    pub user_agent: String,
    pub politeness_delay_ms: u64,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            current_year: None,
            retry_attempts: 3,
            retry_delay_seconds: 1,
            timeout_seconds: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            politeness_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeSection {
    pub start_year: i32,
    pub end_year: i32,
}

impl Default for RangeSection {
    fn default() -> Self {
        Self {
            start_year: 2022,
            end_year: 2025,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractSection {
    pub header_keywords: Vec<String>,
}

impl Default for ExtractSection {
    fn default() -> Self {
        Self {
            header_keywords: DEFAULT_HEADER_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileSection {
    pub exact_only: bool,
    pub window_days: u32,
}

impl Default for ReconcileSection {
    fn default() -> Self {
        Self {
            exact_only: false,
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadSection {
    pub output_path: String,
}

impl Default for LoadSection {
    fn default() -> Self {
        Self {
            output_path: "./output".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringSection {
    pub enabled: bool,
}

impl ReportConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${TSA_BASE_URL})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn years(&self) -> std::ops::RangeInclusive<i32> {
        self.range.start_year..=self.range.end_year
    }

    pub fn output_path(&self) -> &str {
        &self.load.output_path
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.enabled
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            max_attempts: self.source.retry_attempts,
            timeout: Duration::from_secs(self.source.timeout_seconds),
            retry_base_delay: Duration::from_secs(self.source.retry_delay_seconds),
            user_agent: self.source.user_agent.clone(),
        }
    }

    pub fn extract_config(&self) -> ExtractConfig {
        ExtractConfig {
            header_keywords: self.extract.header_keywords.clone(),
        }
    }

    pub fn aggregate_config(&self) -> AggregateConfig {
        AggregateConfig {
            base_url: self.source.base_url.clone(),
            current_year: self.source.current_year,
            politeness_delay: Duration::from_millis(self.source.politeness_delay_ms),
        }
    }

    pub fn match_policy(&self) -> MatchPolicy {
        if self.reconcile.exact_only {
            MatchPolicy::ExactOnly
        } else {
            MatchPolicy::Windowed {
                radius: self.reconcile.window_days,
            }
        }
    }
}

impl Validate for ReportConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("source.base_url", &self.source.base_url)?;
        validation::validate_positive_number(
            "source.retry_attempts",
            self.source.retry_attempts as usize,
            1,
        )?;
        validation::validate_positive_number(
            "source.timeout_seconds",
            self.source.timeout_seconds as usize,
            1,
        )?;
        validation::validate_non_empty_string("source.user_agent", &self.source.user_agent)?;

        validation::validate_range("range.start_year", self.range.start_year, MIN_YEAR, MAX_YEAR)?;
        validation::validate_range("range.end_year", self.range.end_year, MIN_YEAR, MAX_YEAR)?;
        validation::validate_year_span("range", self.range.start_year, self.range.end_year)?;

        if self.extract.header_keywords.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "extract.header_keywords".to_string(),
            });
        }
        for keyword in &self.extract.header_keywords {
            validation::validate_non_empty_string("extract.header_keywords", keyword)?;
        }

        validation::validate_range(
            "reconcile.window_days",
            self.reconcile.window_days,
            0,
            MAX_WINDOW_DAYS,
        )?;
        validation::validate_path("load.output_path", &self.load.output_path)?;

        Ok(())
    }
}
