use crate::adapters::customers::{read_customers, write_error_report};
use crate::config::storage::join_path;
use crate::core::batch::render_emails;
use crate::core::resolver::{ComputedValues, Resolver};
use crate::core::template::ScanMode;
use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{EmailTemplate, MergeInput, MergeOutput, OutputPaths};
use crate::utils::error::Result;

/// Reads customers and the template through `Storage`, renders one email per
/// valid customer, and writes the emails JSON plus the error report.
pub struct MergePipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> MergePipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    /// Scan mode selected by the `strict` placeholder setting.
    pub fn scan_mode(&self) -> ScanMode {
        ScanMode::from_strict(self.config.strict_placeholders())
    }

    /// Standard values plus configured constants. Constants may override `TODAY`.
    pub fn computed_values(&self) -> ComputedValues {
        self.config
            .constants()
            .into_iter()
            .fold(
                ComputedValues::standard(self.config.date_format()),
                |computed, (name, value)| computed.with_constant(name, value),
            )
    }

    async fn read_template(&self) -> Result<EmailTemplate> {
        let path = self.config.template_file();
        let data = self.storage.read_file(path).await?;
        let template: EmailTemplate = serde_json::from_slice(&data)?;
        tracing::debug!("📄 Loaded template from {} ({} bytes of body)", path, template.body.len());
        Ok(template)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for MergePipeline<S, C> {
    async fn extract(&self) -> Result<MergeInput> {
        let path = self.config.customers_file();
        let data = self.storage.read_file(path).await?;
        let customers = read_customers(&data, path, self.config.id_field())?;
        let template = self.read_template().await?;

        Ok(MergeInput {
            template,
            customers,
        })
    }

    async fn transform(&self, input: MergeInput) -> Result<MergeOutput> {
        tracing::info!(
            "🔧 Rendering {} emails",
            input.customers.records.len()
        );

        let computed = self.computed_values();
        tracing::debug!("Computed placeholders: {:?}", computed);
        let resolver = Resolver::new(&computed);

        let emails = render_emails(
            &input.template,
            &input.customers.records,
            self.config.id_field(),
            &resolver,
            self.scan_mode(),
        )?;

        Ok(MergeOutput {
            emails,
            error_report: input.customers.error_report(),
        })
    }

    async fn load(&self, output: &MergeOutput) -> Result<OutputPaths> {
        let emails_path = join_path(self.config.output_path(), self.config.emails_filename());
        let json_data = serde_json::to_string_pretty(&output.emails)?;
        self.storage
            .write_file(&emails_path, json_data.as_bytes())
            .await?;
        tracing::info!("💾 Saved {} emails to {}", output.emails.len(), emails_path);

        let errors_path = self.config.errors_file().to_string();
        let report = write_error_report(&output.error_report)?;
        self.storage.write_file(&errors_path, &report).await?;
        if output.rejected_count() > 0 {
            tracing::warn!(
                "⚠️ {} rows without '{}' written to {}",
                output.rejected_count(),
                self.config.id_field(),
                errors_path
            );
        }

        Ok(OutputPaths {
            emails: emails_path,
            errors: errors_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{DeliverySettings, Email};
    use crate::utils::error::MergeError;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn with_file(self, path: &str, data: &str) -> Self {
            self.files
                .lock()
                .await
                .insert(path.to_string(), data.as_bytes().to_vec());
            self
        }

        async fn get_file(&self, path: &str) -> Option<String> {
            let files = self.files.lock().await;
            files
                .get(path)
                .map(|data| String::from_utf8_lossy(data).into_owned())
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                MergeError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        strict: bool,
        constants: Vec<(String, String)>,
    }

    impl MockConfig {
        fn new() -> Self {
            Self {
                strict: false,
                constants: vec![("TODAY".to_string(), "18 Oct 2026".to_string())],
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn template_file(&self) -> &str {
            "template.json"
        }

        fn customers_file(&self) -> &str {
            "customers.csv"
        }

        fn output_path(&self) -> &str {
            "out"
        }

        fn emails_filename(&self) -> &str {
            "emails.json"
        }

        fn errors_file(&self) -> &str {
            "out/errors.csv"
        }

        fn id_field(&self) -> &str {
            "EMAIL"
        }

        fn date_format(&self) -> &str {
            "%-d %b %Y"
        }

        fn strict_placeholders(&self) -> bool {
            self.strict
        }

        fn constants(&self) -> Vec<(String, String)> {
            self.constants.clone()
        }

        fn delivery(&self) -> Option<DeliverySettings> {
            None
        }
    }

    const TEMPLATE: &str = r#"{
        "from": "The Marketing Team<marketing@example.com>",
        "subject": "A new product is being launched soon...",
        "mimeType": "text/plain",
        "body": "Hi {{TITLE}} {{FIRST_NAME}} {{LAST_NAME}},\nToday, {{TODAY}}, we would like to tell you that..."
    }"#;

    const CUSTOMERS: &str = "TITLE,FIRST_NAME,LAST_NAME,EMAIL\n\
        Mr,John,Smith,john.smith@example.com\n\
        Mrs,Michelle,Smith,\n";

    async fn storage() -> MockStorage {
        MockStorage::new()
            .with_file("template.json", TEMPLATE)
            .await
            .with_file("customers.csv", CUSTOMERS)
            .await
    }

    #[tokio::test]
    async fn test_extract_reads_template_and_customers() {
        let pipeline = MergePipeline::new(storage().await, MockConfig::new());

        let input = pipeline.extract().await.unwrap();

        assert_eq!(input.template.mime_type, "text/plain");
        assert_eq!(input.customers.records.len(), 1);
        assert_eq!(input.customers.rejected_rows.len(), 1);
    }

    #[tokio::test]
    async fn test_extract_accepts_legacy_mime_key() {
        let storage = storage()
            .await
            .with_file(
                "template.json",
                r#"{"from":"a","subject":"b","mineType":"text/html","body":"c"}"#,
            )
            .await;
        let pipeline = MergePipeline::new(storage, MockConfig::new());

        let input = pipeline.extract().await.unwrap();
        assert_eq!(input.template.mime_type, "text/html");
    }

    #[tokio::test]
    async fn test_extract_missing_template_is_io_error() {
        let storage = MockStorage::new()
            .with_file("customers.csv", CUSTOMERS)
            .await;
        let pipeline = MergePipeline::new(storage, MockConfig::new());

        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, MergeError::IoError(_)));
    }

    #[tokio::test]
    async fn test_transform_and_load() {
        let storage = storage().await;
        let pipeline = MergePipeline::new(storage.clone(), MockConfig::new());

        let input = pipeline.extract().await.unwrap();
        let output = pipeline.transform(input).await.unwrap();

        assert_eq!(output.emails.len(), 1);
        assert_eq!(
            output.emails[0].body,
            "Hi Mr John Smith,\nToday, 18 Oct 2026, we would like to tell you that..."
        );
        assert_eq!(output.rejected_count(), 1);

        let paths = pipeline.load(&output).await.unwrap();
        assert_eq!(paths.emails, "out/emails.json");
        assert_eq!(paths.errors, "out/errors.csv");

        let written = storage.get_file("out/emails.json").await.unwrap();
        let emails: Vec<Email> = serde_json::from_str(&written).unwrap();
        assert_eq!(emails, output.emails);
        assert!(written.contains("\"mimeType\": \"text/plain\""));

        let errors = storage.get_file("out/errors.csv").await.unwrap();
        assert_eq!(errors, "TITLE,FIRST_NAME,LAST_NAME,EMAIL\nMrs,Michelle,Smith,\n");
    }

    #[tokio::test]
    async fn test_strict_mode_fails_transform() {
        let storage = storage()
            .await
            .with_file(
                "template.json",
                r#"{"from":"a","subject":"b","mimeType":"text/plain","body":"Hi {{FIRST_NAME"}"#,
            )
            .await;
        let mut config = MockConfig::new();
        config.strict = true;
        let pipeline = MergePipeline::new(storage, config);

        let input = pipeline.extract().await.unwrap();
        let err = pipeline.transform(input).await.unwrap_err();
        assert!(matches!(err, MergeError::TemplateError(_)));
    }

    #[test]
    fn test_scan_mode_follows_strict_setting() {
        let pipeline = MergePipeline::new(MockStorage::new(), MockConfig::new());
        assert_eq!(pipeline.scan_mode(), ScanMode::Lenient);

        let mut config = MockConfig::new();
        config.strict = true;
        let pipeline = MergePipeline::new(MockStorage::new(), config);
        assert_eq!(pipeline.scan_mode(), ScanMode::Strict);
    }

    #[test]
    fn test_computed_values_include_today_and_constants() {
        let mut config = MockConfig::new();
        config.constants = vec![("COMPANY".to_string(), "Acme".to_string())];
        let pipeline = MergePipeline::new(MockStorage::new(), config);

        let computed = pipeline.computed_values();
        assert!(computed.contains("TODAY"));
        assert_eq!(computed.get("COMPANY").as_deref(), Some("Acme"));
    }
}
