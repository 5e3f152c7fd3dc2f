pub mod toml_config;

pub use toml_config::ReportConfig;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

/// Command-line flags. Anything given here wins over the TOML file.
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "passenger-volume-etl")]
#[command(about = "Scrapes daily passenger volumes and builds a year-over-year report")]
pub struct CliConfig {
    #[arg(long, short = 'c', help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub start_year: Option<i32>,

    #[arg(long)]
    pub end_year: Option<i32>,

    #[arg(long, help = "Base URL of the yearly passenger volume pages")]
    pub base_url: Option<String>,

    #[arg(long)]
    pub output_path: Option<String>,

    #[arg(long, help = "Only compare against the exact day 365 days earlier")]
    pub exact_only: bool,

    #[arg(long, short = 'v', help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log phase timings and memory usage")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[arg(long, help = "Validate configuration and exit without fetching")]
    pub dry_run: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Loads the file named by `--config` (or defaults) and applies the flags on top.
    pub fn load_report_config(&self) -> crate::Result<ReportConfig> {
        let mut config = match &self.config {
            Some(path) => ReportConfig::from_file(path)?,
            None => ReportConfig::default(),
        };
        self.apply_to(&mut config);
        Ok(config)
    }

    pub fn apply_to(&self, config: &mut ReportConfig) {
        if let Some(year) = self.start_year {
            config.range.start_year = year;
        }
        if let Some(year) = self.end_year {
            config.range.end_year = year;
        }
        if let Some(url) = &self.base_url {
            config.source.base_url = url.clone();
        }
        if let Some(path) = &self.output_path {
            config.load.output_path = path.clone();
        }
        if self.exact_only {
            config.reconcile.exact_only = true;
        }
        if self.monitor {
            config.monitoring.enabled = true;
        }
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use crate::core::reconcile::MatchPolicy;

    #[test]
    fn test_parse_flags() {
        let cli = CliConfig::parse_from([
            "passenger-volume-etl",
            "--start-year",
            "2023",
            "--end-year",
            "2024",
            "--exact-only",
            "--dry-run",
        ]);

        assert_eq!(cli.start_year, Some(2023));
        assert_eq!(cli.end_year, Some(2024));
        assert!(cli.exact_only);
        assert!(cli.dry_run);
        assert!(!cli.log_json);
    }

    #[test]
    fn test_flags_override_file_values() {
        let mut config = ReportConfig::from_toml_str(
            r#"
[range]
start_year = 2020
end_year = 2021

[load]
output_path = "./from-file"
"#,
        )
        .unwrap();

        let cli = CliConfig {
            end_year: Some(2024),
            output_path: Some("./from-cli".to_string()),
            exact_only: true,
            monitor: true,
            ..Default::default()
        };
        cli.apply_to(&mut config);

        assert_eq!(config.years(), 2020..=2024);
        assert_eq!(config.output_path(), "./from-cli");
        assert_eq!(config.match_policy(), MatchPolicy::ExactOnly);
        assert!(config.monitoring_enabled());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let cli = CliConfig::parse_from(["passenger-volume-etl"]);
        assert_eq!(cli.load_report_config().unwrap(), ReportConfig::default());
    }
}
