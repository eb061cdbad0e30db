use anyhow::Context;
use clap::Parser;
use mail_merge::adapters::delivery::configured_service;
use mail_merge::core::{ConfigProvider, Pipeline};
use mail_merge::utils::{logger, validation::Validate};
use mail_merge::{LocalStorage, MergeEngine, MergeError, MergePipeline, Scanner, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-merge")]
#[command(about = "Mail merge driven by a TOML job file")]
struct Args {
    /// Path to TOML job file
    #[arg(short, long, default_value = "merge-job.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Override placeholders.strict from the job file
    #[arg(long)]
    strict: Option<bool>,

    /// Read and render without writing files or sending
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init_logger(args.verbose, args.json_logs);

    tracing::info!("🚀 Starting TOML-based mail merge");
    tracing::info!("📁 Loading job from: {}", args.config);

    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load job file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if let Some(strict) = args.strict {
        config.placeholders.strict = Some(strict);
        tracing::info!("🔧 Strict placeholders overridden to: {}", strict);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Job loaded and validated successfully");
    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be written or sent");
        if let Err(e) = perform_dry_run(config).await {
            match e.downcast_ref::<MergeError>() {
                Some(merge_error) => std::process::exit(merge_error.report()),
                None => return Err(e),
            }
        }
        return Ok(());
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
            }
        }
        Err(e) => std::process::exit(e.report()),
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Job Summary:");
    println!("  Job: {}", config.job.name);
    if let Some(description) = &config.job.description {
        println!("  Description: {}", description);
    }
    println!("  Template: {}", config.template_file());
    println!("  Customers: {} (id field: {})", config.customers_file(), config.id_field());
    println!(
        "  Output: {}/{}",
        config.output_path(),
        config.emails_filename()
    );
    println!("  Errors: {}", config.errors_file());
    println!("  Strict placeholders: {}", config.strict_placeholders());

    if let Some(delivery) = &config.delivery {
        println!("  Delivery: {}", delivery.service);
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run(config: TomlConfig) -> anyhow::Result<()> {
    let pipeline = MergePipeline::new(LocalStorage::default(), config);

    let input = pipeline
        .extract()
        .await
        .context("reading customers and template")?;

    let mode = pipeline.scan_mode();
    let parsed = Scanner::new(mode)
        .scan(&input.template.body)
        .map_err(MergeError::from)
        .context("scanning template body")?;
    let computed = pipeline.computed_values();

    println!("🔍 Dry Run Analysis:");
    println!();
    println!("📄 Template ({:?} scan):", mode);
    println!("  Skeleton: {}", parsed.skeleton());
    println!("  Placeholders: {}", parsed.names().len());
    for name in parsed.names() {
        let source = if input.customers.header.iter().any(|column| column == name) {
            "record"
        } else if computed.contains(name) {
            "computed"
        } else {
            "unresolved, kept as marker"
        };
        println!("    {{{{{}}}}} <- {}", name, source);
    }

    println!();
    println!("👥 Customers:");
    println!("  Accepted: {}", input.customers.records.len());
    println!("  Rejected: {}", input.customers.rejected_rows.len());

    let output = pipeline.transform(input).await.context("rendering emails")?;
    if let Some(first) = output.emails.first() {
        println!();
        println!("✉️ First rendered email ({}):", first.to);
        println!("{}", first.body);
    }

    println!();
    println!("✅ Dry run analysis complete.");
    Ok(())
}
