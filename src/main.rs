use clap::Parser;
use passenger_volume_etl::utils::error::ErrorSeverity;
use passenger_volume_etl::utils::{logger, validation::Validate};
use passenger_volume_etl::{
    CliConfig, EtlEngine, HttpFetcher, LocalStorage, ReportConfig, TracingObserver,
    VolumeReportPipeline,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting passenger-volume-etl");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 載入配置並套用命令列覆蓋
    let config = match cli.load_report_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Failed to load configuration: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, &cli);

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No pages will be fetched");
        perform_dry_run(&config);
        return Ok(());
    }

    let monitor_enabled = config.monitoring_enabled();
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 建立抓取器、存儲和管道
    let observer = Arc::new(TracingObserver);
    let fetcher = HttpFetcher::new(config.fetch_config(), observer.clone())?;
    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = VolumeReportPipeline::from_config(&config, storage, fetcher, observer);

    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Report completed successfully!");
            println!("✅ Report completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Report run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,      // 警告，但成功
                ErrorSeverity::Medium => 2,   // 來源無資料或暫時失敗
                ErrorSeverity::High => 1,     // 處理錯誤
                ErrorSeverity::Critical => 3, // 系統錯誤
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &ReportConfig, cli: &CliConfig) {
    println!("📋 Configuration Summary:");
    if let Some(path) = &cli.config {
        println!("  Config file: {}", path.display());
    }
    println!("  Source: {}", config.source.base_url);
    println!(
        "  Years: {} - {}",
        config.range.start_year, config.range.end_year
    );
    println!("  Matching: {:?}", config.match_policy());
    println!("  Output: {}", config.output_path());

    if cli.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &ReportConfig) {
    let aggregate = config.aggregate_config();
    let fetch = config.fetch_config();

    println!("🔍 Dry Run Analysis:");
    println!();
    println!("📡 Pages to fetch:");
    for year in config.years() {
        println!("  {} -> {}", year, aggregate.url_for(year, config.range.end_year));
    }
    println!(
        "  Attempts per page: {} (timeout {:?}, base backoff {:?})",
        fetch.max_attempts, fetch.timeout, fetch.retry_base_delay
    );
    println!("  Delay between pages: {:?}", aggregate.politeness_delay);

    println!();
    println!("📊 Table detection:");
    println!(
        "  Header keywords: {}",
        config.extract.header_keywords.join(", ")
    );

    println!();
    println!("✅ Dry run analysis complete.");
}
