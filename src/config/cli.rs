use crate::config::parse_key_value;
use crate::core::batch::DEFAULT_ID_FIELD;
use crate::core::resolver::DEFAULT_DATE_FORMAT;
use crate::domain::model::DeliverySettings;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_date_format, validate_file_extension, validate_non_empty_string, validate_path,
    validate_url, Validate,
};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "mail-merge")]
#[command(about = "Render a message template for every customer in a CSV file")]
pub struct CliConfig {
    /// JSON template with from, subject, mimeType and body
    #[arg(long)]
    pub template_file: String,

    /// Customers CSV; the first row is the header
    #[arg(long)]
    pub customers_file: String,

    /// Directory that receives the rendered emails
    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = "emails.json")]
    pub emails_filename: String,

    /// CSV file receiving the header plus every row without an identifying value
    #[arg(long)]
    pub errors_file: String,

    #[arg(long, default_value = DEFAULT_ID_FIELD)]
    pub id_field: String,

    /// strftime format for {{TODAY}}
    #[arg(long, default_value = DEFAULT_DATE_FORMAT)]
    pub date_format: String,

    /// Fail on unterminated placeholders instead of dropping them
    #[arg(long)]
    pub strict: bool,

    /// Extra placeholder values, e.g. --set COMPANY=Acme
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub constants: Vec<(String, String)>,

    /// Delivery service to send the rendered emails with (log, webhook)
    #[arg(long)]
    pub email_service: Option<String>,

    #[arg(long)]
    pub webhook_endpoint: Option<String>,

    #[arg(long)]
    pub webhook_health_endpoint: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl ConfigProvider for CliConfig {
    fn template_file(&self) -> &str {
        &self.template_file
    }

    fn customers_file(&self) -> &str {
        &self.customers_file
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn emails_filename(&self) -> &str {
        &self.emails_filename
    }

    fn errors_file(&self) -> &str {
        &self.errors_file
    }

    fn id_field(&self) -> &str {
        &self.id_field
    }

    fn date_format(&self) -> &str {
        &self.date_format
    }

    fn strict_placeholders(&self) -> bool {
        self.strict
    }

    fn constants(&self) -> Vec<(String, String)> {
        self.constants.clone()
    }

    fn delivery(&self) -> Option<DeliverySettings> {
        self.email_service.as_ref().map(|service| DeliverySettings {
            service: service.clone(),
            endpoint: self.webhook_endpoint.clone(),
            health_endpoint: self.webhook_health_endpoint.clone(),
            timeout_seconds: None,
            headers: None,
        })
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("template_file", &self.template_file)?;
        validate_file_extension("template_file", &self.template_file, &["json"])?;
        validate_path("customers_file", &self.customers_file)?;
        validate_file_extension("customers_file", &self.customers_file, &["csv"])?;
        validate_path("output_path", &self.output_path)?;
        validate_path("emails_filename", &self.emails_filename)?;
        validate_path("errors_file", &self.errors_file)?;
        validate_non_empty_string("id_field", &self.id_field)?;
        validate_date_format("date_format", &self.date_format)?;

        if let Some(service) = &self.email_service {
            validate_non_empty_string("email_service", service)?;
        }
        if let Some(endpoint) = &self.webhook_endpoint {
            validate_url("webhook_endpoint", endpoint)?;
        }
        if let Some(endpoint) = &self.webhook_health_endpoint {
            validate_url("webhook_health_endpoint", endpoint)?;
        }
        Ok(())
    }
}
