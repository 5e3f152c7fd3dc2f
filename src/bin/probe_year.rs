use clap::Parser;
use passenger_volume_etl::core::extract::TableExtractor;
use passenger_volume_etl::domain::ports::PageSource;
use passenger_volume_etl::utils::logger;
use passenger_volume_etl::utils::validation::Validate;
use passenger_volume_etl::{HttpFetcher, ReportConfig, TracingObserver};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "probe-year")]
#[command(about = "Fetch a single year's page and show what the extractor finds")]
struct Args {
    /// Year to fetch
    year: i32,

    /// TOML configuration file (source and extract sections are used)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Treat this year as the one served at the bare base URL
    #[arg(long)]
    current: bool,

    /// Number of rows to print from each end of the series
    #[arg(long, default_value = "5")]
    rows: usize,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// URL the aggregator would request for `year`; `current` forces the bare base.
fn page_url(config: &ReportConfig, year: i32, current: bool) -> String {
    let mut aggregate = config.aggregate_config();
    if current {
        aggregate.current_year = Some(year);
    }
    aggregate.url_for(year, config.range.end_year)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    let config = match &args.config {
        Some(path) => ReportConfig::from_file(path)?,
        None => ReportConfig::default(),
    };
    config.validate()?;

    let url = page_url(&config, args.year, args.current);

    println!("🌐 Fetching {} from {}", args.year, url);

    let observer = Arc::new(TracingObserver);
    let fetcher = HttpFetcher::new(config.fetch_config(), observer.clone())?;
    let markup = match fetcher.fetch(&url).await {
        Ok(markup) => markup,
        Err(failure) => {
            eprintln!("❌ {}", failure);
            std::process::exit(2);
        }
    };
    println!("📄 Received {} bytes", markup.len());

    let extractor = TableExtractor::new(&config.extract_config(), observer);
    let extraction = extractor.extract_detailed(&markup, args.year);

    match (extraction.matcher, extraction.table_index) {
        (Some(matcher), Some(index)) => {
            println!("🔎 Table #{} selected by {}", index, matcher)
        }
        _ => {
            println!("❌ No data table found");
            std::process::exit(2);
        }
    }
    println!(
        "📊 {} records extracted ({} rows seen, {} skipped)",
        extraction.series.len(),
        extraction.rows_seen,
        extraction.rows_skipped
    );

    let records = extraction.series.records();
    let head = records.iter().take(args.rows);
    let tail_start = records.len().saturating_sub(args.rows).max(args.rows);
    println!();
    println!("{:<12} {:>12}", "date", "volume");
    for record in head {
        println!("{:<12} {:>12}", record.date, record.volume);
    }
    if tail_start < records.len() {
        if tail_start > args.rows {
            println!("{:<12} {:>12}", "...", "");
        }
        for record in &records[tail_start..] {
            println!("{:<12} {:>12}", record.date, record.volume);
        }
    }

    Ok(())
}
