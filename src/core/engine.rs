use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Drives one pipeline through extract, transform and load.
pub struct FigureEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> FigureEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor),
        }
    }

    pub fn run(&mut self) -> Result<Vec<String>> {
        let name = self.pipeline.name();
        tracing::info!("Starting {}", name);

        tracing::debug!("{}: extracting", name);
        let extracted = self.pipeline.extract()?;
        self.monitor.log_stats("Extract");

        tracing::debug!("{}: transforming", name);
        let transformed = self.pipeline.transform(extracted)?;
        self.monitor.log_stats("Transform");

        tracing::debug!("{}: rendering", name);
        let outputs = self.pipeline.load(transformed)?;
        self.monitor.log_stats("Load");

        for output in &outputs {
            tracing::info!("✓ {} wrote {}", name, output);
        }
        self.monitor.log_final_stats();

        Ok(outputs)
    }
}
