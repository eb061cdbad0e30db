use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One customer row, keyed by header column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub data: HashMap<String, String>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.data.get(field).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            data: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Message template as stored in the template JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTemplate {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub subject: String,
    #[serde(rename = "mimeType", alias = "mineType", default)]
    pub mime_type: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub from: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub to: String,
    pub subject: String,
    #[serde(rename = "mimeType", alias = "mineType")]
    pub mime_type: String,
    pub body: String,
}

/// Parsed record source: valid records plus the rows diverted for the error report.
#[derive(Debug, Clone, Default)]
pub struct CustomerBatch {
    pub header: Vec<String>,
    pub records: Vec<Record>,
    pub rejected_rows: Vec<Vec<String>>,
}

impl CustomerBatch {
    /// Header row followed by every rejected row, as written to the errors file.
    pub fn error_report(&self) -> Vec<Vec<String>> {
        std::iter::once(self.header.clone())
            .chain(self.rejected_rows.iter().cloned())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct MergeInput {
    pub template: EmailTemplate,
    pub customers: CustomerBatch,
}

#[derive(Debug, Clone)]
pub struct MergeOutput {
    pub emails: Vec<Email>,
    pub error_report: Vec<Vec<String>>,
}

impl MergeOutput {
    pub fn rejected_count(&self) -> usize {
        self.error_report.len().saturating_sub(1)
    }
}

/// Where the load step wrote its files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputPaths {
    pub emails: String,
    pub errors: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverySettings {
    pub service: String,
    pub endpoint: Option<String>,
    pub health_endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    pub emails_path: String,
    pub errors_path: String,
    pub rendered: usize,
    pub rejected: usize,
    /// Recipient to status, present when a delivery service ran.
    pub delivery: Option<HashMap<String, String>>,
}
