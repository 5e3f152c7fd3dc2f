use chrono::NaiveDate;
use httpmock::prelude::*;
use passenger_volume_etl::utils::error::{ErrorCategory, ErrorSeverity};
use passenger_volume_etl::utils::validation::Validate;
use passenger_volume_etl::{
    EtlEngine, EtlError, HttpFetcher, LocalStorage, ReportConfig, TracingObserver,
    VolumeReportPipeline,
};
use std::io::Read;
use std::sync::Arc;
use tempfile::TempDir;

const PATH: &str = "/travel/passenger-volumes";

/// A page shaped like the published one: a layout table first, then the data.
fn volume_page(rows: &[(&str, &str)]) -> String {
    let body: String = rows
        .iter()
        .map(|(date, volume)| format!("<tr><td>{}</td><td>{}</td></tr>", date, volume))
        .collect();
    format!(
        r#"<html><body>
<table class="menu"><tr><th>Travel</th><th>Security</th></tr><tr><td>Home</td><td>About</td></tr></table>
<table class="views-table"><thead><tr><th>Date</th><th>Numbers</th></tr></thead>
<tbody>{}</tbody></table>
</body></html>"#,
        body
    )
}

/// Same data without header cells, so only the row shape identifies it.
fn headerless_page(rows: &[(&str, &str)]) -> String {
    let body: String = rows
        .iter()
        .map(|(date, volume)| format!("<tr><td>{}</td><td>{}</td></tr>", date, volume))
        .collect();
    format!(
        "<html><body><table><tr><td>Day</td><td>Count</td></tr>{}</table></body></html>",
        body
    )
}

fn test_config(server: &MockServer, output_path: &str) -> ReportConfig {
    let mut config = ReportConfig::default();
    config.source.base_url = server.url(PATH);
    config.source.retry_attempts = 1;
    config.source.retry_delay_seconds = 0;
    config.source.politeness_delay_ms = 0;
    config.range.start_year = 2023;
    config.range.end_year = 2024;
    config.load.output_path = output_path.to_string();
    config
}

fn engine(config: &ReportConfig) -> EtlEngine<VolumeReportPipeline<LocalStorage, HttpFetcher>> {
    let observer = Arc::new(TracingObserver);
    let fetcher = HttpFetcher::new(config.fetch_config(), observer.clone()).unwrap();
    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = VolumeReportPipeline::from_config(config, storage, fetcher, observer)
        .with_run_date(NaiveDate::from_ymd_opt(2024, 3, 20).unwrap());
    EtlEngine::new_with_monitoring(pipeline, false)
}

fn read_entry<R: std::io::Read + std::io::Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> String {
    let mut file = archive.by_name(name).unwrap();
    let mut content = String::new();
    file.read_to_string(&mut content).unwrap();
    content
}

#[tokio::test]
async fn test_end_to_end_report() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let prior_mock = server.mock(|when, then| {
        when.method(GET).path(format!("{}/2023", PATH));
        then.status(200).body(volume_page(&[
            ("3/17/2023", "2,050,000"),
            ("3/16/2023", "2,000,000"),
            ("3/15/2023", "1,900,000"),
        ]));
    });
    let current_mock = server.mock(|when, then| {
        when.method(GET).path(PATH);
        then.status(200).body(volume_page(&[
            ("3/16/2024", "2,255,000"),
            ("3/15/2024", "2,200,000"),
            ("not a date", "1"),
        ]));
    });

    let config = test_config(&server, &output_path);
    assert!(config.validate().is_ok());

    let result = engine(&config).run().await;

    prior_mock.assert();
    current_mock.assert();
    let bundle = result.unwrap();
    assert!(bundle.ends_with("passenger_volume_report_20240320.zip"));

    let raw_csv = temp_dir.path().join("passenger_volumes_20240320.csv");
    assert!(raw_csv.exists());

    let zip_data = std::fs::read(temp_dir.path().join("passenger_volume_report_20240320.zip")).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();

    let volumes = read_entry(&mut archive, "volumes.csv");
    let lines: Vec<&str> = volumes.lines().collect();
    assert_eq!(lines[0], "date,passenger_volume,year");
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[1], "2023-03-15,1900000,2023");
    assert_eq!(lines[5], "2024-03-16,2255000,2024");

    let yoy = read_entry(&mut archive, "yoy.csv");
    // 2024-03-15 minus 365 days lands on 2023-03-16
    let row = yoy.lines().find(|l| l.starts_with("2024-03-15")).unwrap();
    assert!(row.starts_with("2024-03-15,2200000,2024,2023-03-16,2000000,1.1,"));
    assert!(yoy.lines().any(|l| l == "2023-03-15,1900000,2023,,,,"));

    let summary: serde_json::Value =
        serde_json::from_str(&read_entry(&mut archive, "summary.json")).unwrap();
    assert_eq!(summary["latest_date"], "2024-03-16");
    assert_eq!(summary["latest_volume"], 2_255_000);
    assert_eq!(summary["total_records"], 5);
}

#[tokio::test]
async fn test_failed_year_does_not_abort_run() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let prior_mock = server.mock(|when, then| {
        when.method(GET).path(format!("{}/2023", PATH));
        then.status(500);
    });
    server.mock(|when, then| {
        when.method(GET).path(PATH);
        then.status(200)
            .body(headerless_page(&[("01/02/24", "2,100"), ("01/01/24", "2,000")]));
    });

    let config = test_config(&server, &output_path);
    let bundle = engine(&config).run().await.unwrap();

    prior_mock.assert_hits(1);
    let zip_data = std::fs::read(&bundle).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
    let volumes = read_entry(&mut archive, "volumes.csv");
    assert_eq!(
        volumes,
        "date,passenger_volume,year\n2024-01-01,2000,2024\n2024-01-02,2100,2024\n"
    );
}

#[tokio::test]
async fn test_no_data_for_any_year() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let any_mock = server.mock(|when, then| {
        when.method(GET);
        then.status(200).body("<html><body><p>Page moved</p></body></html>");
    });

    let config = test_config(&server, &output_path);
    let err = engine(&config).run().await.unwrap_err();

    any_mock.assert_hits(2);
    assert!(matches!(
        err,
        EtlError::NoData {
            start_year: 2023,
            end_year: 2024
        }
    ));
    assert_eq!(err.category(), ErrorCategory::Data);
    assert_eq!(err.severity(), ErrorSeverity::Medium);
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_run_from_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(PATH);
        then.status(200)
            .body(volume_page(&[("1/1/2025", "1,000"), ("1/2/2025", "1,100")]));
    });

    let output_path = temp_dir.path().join("reports");
    let config_path = temp_dir.path().join("report.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[source]
base_url = "{}"
retry_attempts = 1
politeness_delay_ms = 0

[range]
start_year = 2025
end_year = 2025

[reconcile]
exact_only = true

[load]
output_path = "{}"
"#,
            server.url(PATH),
            output_path.display()
        ),
    )
    .unwrap();

    let config = ReportConfig::from_file(&config_path).unwrap();
    config.validate().unwrap();

    let bundle = engine(&config).run().await.unwrap();

    assert!(std::path::Path::new(&bundle).exists());
    assert!(output_path.join("passenger_volumes_20240320.csv").exists());
}
