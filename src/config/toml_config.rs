use crate::core::batch::DEFAULT_ID_FIELD;
use crate::core::resolver::DEFAULT_DATE_FORMAT;
use crate::domain::model::DeliverySettings;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{MergeError, Result};
use crate::utils::validation::{
    validate_date_format, validate_file_extension, validate_non_empty_string, validate_path,
    validate_positive_number, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

/// A mail-merge job described in a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub job: JobConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub placeholders: PlaceholderConfig,
    pub delivery: Option<DeliverySettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub template_file: String,
    pub customers_file: String,
    pub id_field: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub output_path: String,
    pub emails_filename: Option<String>,
    pub errors_file: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaceholderConfig {
    pub strict: Option<bool>,
    pub date_format: Option<String>,
    pub constants: Option<BTreeMap<String, String>>,
}

impl TomlConfig {
    /// Loads a job from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MergeError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses a job from TOML text, after `${VAR}` substitution.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| MergeError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unset variables stay as written.
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| {
            Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env var pattern is valid")
        });

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("job.name", &self.job.name)?;

        validate_path("input.template_file", &self.input.template_file)?;
        validate_file_extension("input.template_file", &self.input.template_file, &["json"])?;
        validate_path("input.customers_file", &self.input.customers_file)?;
        validate_file_extension("input.customers_file", &self.input.customers_file, &["csv"])?;
        if let Some(id_field) = &self.input.id_field {
            validate_non_empty_string("input.id_field", id_field)?;
        }

        validate_path("output.output_path", &self.output.output_path)?;
        validate_path("output.errors_file", &self.output.errors_file)?;
        if let Some(name) = &self.output.emails_filename {
            validate_path("output.emails_filename", name)?;
        }

        validate_date_format("placeholders.date_format", self.date_format())?;

        if let Some(delivery) = &self.delivery {
            validate_non_empty_string("delivery.service", &delivery.service)?;
            if let Some(endpoint) = &delivery.endpoint {
                validate_url("delivery.endpoint", endpoint)?;
            }
            if let Some(endpoint) = &delivery.health_endpoint {
                validate_url("delivery.health_endpoint", endpoint)?;
            }
            if let Some(timeout) = delivery.timeout_seconds {
                validate_positive_number("delivery.timeout_seconds", timeout, 1)?;
            }
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn template_file(&self) -> &str {
        &self.input.template_file
    }

    fn customers_file(&self) -> &str {
        &self.input.customers_file
    }

    fn output_path(&self) -> &str {
        &self.output.output_path
    }

    fn emails_filename(&self) -> &str {
        self.output.emails_filename.as_deref().unwrap_or("emails.json")
    }

    fn errors_file(&self) -> &str {
        &self.output.errors_file
    }

    fn id_field(&self) -> &str {
        self.input.id_field.as_deref().unwrap_or(DEFAULT_ID_FIELD)
    }

    fn date_format(&self) -> &str {
        self.placeholders
            .date_format
            .as_deref()
            .unwrap_or(DEFAULT_DATE_FORMAT)
    }

    fn strict_placeholders(&self) -> bool {
        self.placeholders.strict.unwrap_or(false)
    }

    fn constants(&self) -> Vec<(String, String)> {
        self.placeholders
            .constants
            .as_ref()
            .map(|constants| {
                constants
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn delivery(&self) -> Option<DeliverySettings> {
        self.delivery.clone()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
