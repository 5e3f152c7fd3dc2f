use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::RunMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: RunMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: RunMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Runs extract, transform and load; returns the report location.
    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Starting passenger volume report");

        // Extract
        let series = self.pipeline.extract().await?;
        match (series.first(), series.last()) {
            (Some(first), Some(last)) => tracing::info!(
                "📥 Extracted {} records ({} to {})",
                series.len(),
                first.date,
                last.date
            ),
            _ => tracing::info!("📥 Extracted {} records", series.len()),
        }
        self.monitor.log_phase("extract");

        // Transform
        let report = self.pipeline.transform(series).await?;
        tracing::info!(
            "🔄 {}/{} records have YoY data",
            report.yoy_coverage(),
            report.yoy.len()
        );
        if let Some(summary) = &report.summary {
            tracing::info!("📈 Summary\n{}", summary);
        }
        self.monitor.log_phase("transform");

        // Load
        let output_path = self.pipeline.load(report).await?;
        tracing::info!("✅ Report saved to {}", output_path);
        self.monitor.log_phase("load");
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}
