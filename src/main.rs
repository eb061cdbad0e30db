use clap::Parser;
use mail_merge::adapters::delivery::configured_service;
use mail_merge::core::ConfigProvider;
use mail_merge::utils::{logger, validation::Validate};
use mail_merge::{CliConfig, LocalStorage, MergeEngine, MergePipeline};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    logger::init_logger(config.verbose, config.json_logs);

    tracing::info!("Starting mail-merge CLI");
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let delivery = match configured_service(config.delivery()) {
        Ok(delivery) => delivery,
        Err(e) => std::process::exit(e.report()),
    };

    let pipeline = MergePipeline::new(LocalStorage::default(), config);
    let mut engine = MergeEngine::new(pipeline);
    if let Some(service) = delivery {
        engine = engine.with_delivery(service);
    }

    match engine.run().await {
        Ok(report) => {
            println!("✅ Rendered {} emails", report.rendered);
            println!("📁 Emails saved to: {}", report.emails_path);
            println!(
                "📁 Error report ({} rejected rows): {}",
                report.rejected, report.errors_path
            );
            if let Some(statuses) = report.delivery {
                println!("📤 Delivery statuses: {}", statuses.len());
                for (recipient, status) in statuses {
                    println!("  {} -> {}", recipient, status);
                }
            }
        }
        Err(e) => std::process::exit(e.report()),
    }

    Ok(())
}
