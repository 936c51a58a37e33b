use crate::core::Pipeline;
use crate::domain::model::RunOutcome;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        tracing::info!("Starting ETL process...");

        // Extract
        let extracted = self.pipeline.extract().await?;
        let skipped = extracted.reports.iter().filter(|r| r.is_skipped()).count();
        tracing::info!(
            "Extracted {} tables ({} files skipped)",
            extracted.tables.len(),
            skipped
        );
        self.monitor.log_stats("Extract");

        // Transform
        let transformed = self.pipeline.transform(extracted).await?;
        tracing::info!("Transformed {} records", transformed.records.len());
        self.monitor.log_stats("Transform");

        // Load
        let outcome = self.pipeline.load(transformed).await?;
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(outcome)
    }
}
