use crate::core::template::TemplateError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Delivery request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    TemplateError(#[from] TemplateError),

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Record source has no '{column}' column")]
    MissingIdentifierColumn { column: String },

    #[error("Record source '{path}' is empty")]
    EmptyRecordSource { path: String },

    #[error("Unknown email service '{name}'. Available: {available}")]
    UnknownDeliveryService { name: String, available: String },

    #[error("Email service '{service}' failed: {message}")]
    DeliveryError { service: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Template,
    Output,
    Delivery,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl MergeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MergeError::ConfigValidationError { .. }
            | MergeError::InvalidConfigValueError { .. }
            | MergeError::MissingConfigError { .. }
            | MergeError::UnknownDeliveryService { .. } => ErrorCategory::Configuration,
            MergeError::CsvError(_)
            | MergeError::MissingIdentifierColumn { .. }
            | MergeError::EmptyRecordSource { .. } => ErrorCategory::Input,
            MergeError::TemplateError(_) => ErrorCategory::Template,
            MergeError::SerializationError(_) => ErrorCategory::Output,
            MergeError::ApiError(_) | MergeError::DeliveryError { .. } => ErrorCategory::Delivery,
            MergeError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Delivery => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Input | ErrorCategory::Template => {
                ErrorSeverity::High
            }
            ErrorCategory::Output | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            MergeError::MissingIdentifierColumn { column } => format!(
                "Add a '{}' column to the header row or pass --id-field with the right column name",
                column
            ),
            MergeError::EmptyRecordSource { .. } => {
                "The customers file needs at least a header row".to_string()
            }
            MergeError::CsvError(_) => {
                "Check the customers file is valid CSV with a header row".to_string()
            }
            MergeError::TemplateError(_) => {
                "Close every '{{' marker with '}}' or run without --strict".to_string()
            }
            MergeError::SerializationError(_) => {
                "Check the template file is a JSON object with from, subject, mimeType and body"
                    .to_string()
            }
            MergeError::UnknownDeliveryService { available, .. } => {
                format!("Choose one of: {}", available)
            }
            MergeError::ApiError(_) | MergeError::DeliveryError { .. } => {
                "Rendered emails were saved; check the delivery endpoint and send them again"
                    .to_string()
            }
            MergeError::IoError(_) => {
                "Check that the input files exist and the output directory is writable".to_string()
            }
            MergeError::ConfigValidationError { .. }
            | MergeError::InvalidConfigValueError { .. }
            | MergeError::MissingConfigError { .. } => {
                "Review the command line flags or the job file".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Input => format!("Could not read customer records: {}", self),
            ErrorCategory::Template => format!("Could not parse the template: {}", self),
            ErrorCategory::Output => format!("Could not process output: {}", self),
            ErrorCategory::Delivery => format!("Sending emails failed: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }

    /// Process exit code for a failed run. Always non-zero.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    /// Logs the failure, prints the operator message and suggestion to
    /// stderr, and returns the exit code to use.
    pub fn report(&self) -> i32 {
        tracing::error!(
            "❌ Mail merge failed: {} (Category: {:?}, Severity: {:?})",
            self,
            self.category(),
            self.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", self.recovery_suggestion());

        eprintln!("❌ {}", self.user_friendly_message());
        eprintln!("💡 {}", self.recovery_suggestion());
        self.exit_code()
    }
}

pub type Result<T> = std::result::Result<T, MergeError>;
