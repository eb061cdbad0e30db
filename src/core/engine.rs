use crate::core::{EmailService, Pipeline};
use crate::domain::model::MergeReport;
use crate::utils::error::Result;

/// Runs one batch: extract, transform, load, then optional delivery.
pub struct MergeEngine<P: Pipeline> {
    pipeline: P,
    delivery: Option<Box<dyn EmailService>>,
}

impl<P: Pipeline> MergeEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            delivery: None,
        }
    }

    pub fn with_delivery(mut self, service: Box<dyn EmailService>) -> Self {
        self.delivery = Some(service);
        self
    }

    pub async fn run(&self) -> Result<MergeReport> {
        tracing::info!("🚀 Starting mail merge");

        tracing::info!("📥 Reading customers and template...");
        let input = self.pipeline.extract().await?;
        tracing::info!(
            "📥 {} customers accepted, {} rejected",
            input.customers.records.len(),
            input.customers.rejected_rows.len()
        );

        let output = self.pipeline.transform(input).await?;
        tracing::info!("🔧 Rendered {} emails", output.emails.len());

        let paths = self.pipeline.load(&output).await?;

        let mut report = MergeReport {
            emails_path: paths.emails,
            errors_path: paths.errors,
            rendered: output.emails.len(),
            rejected: output.rejected_count(),
            delivery: None,
        };

        if let Some(service) = &self.delivery {
            if !service.is_available().await {
                tracing::warn!(
                    "📭 Email service '{}' is unavailable, skipping delivery",
                    service.name()
                );
                return Ok(report);
            }

            tracing::info!(
                "📤 Sending {} emails via '{}'",
                output.emails.len(),
                service.name()
            );
            let statuses = service.send_emails(&output.emails).await?;
            for (recipient, status) in &statuses {
                tracing::debug!("📤 {}: {}", recipient, status);
            }
            tracing::info!("📤 Delivery finished: {} statuses", statuses.len());
            report.delivery = Some(statuses);
        }

        Ok(report)
    }
}
