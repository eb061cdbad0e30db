use mail_merge::domain::model::Email;
use mail_merge::utils::validation::Validate;
use mail_merge::{LocalStorage, MergeEngine, MergeError, MergePipeline, TomlConfig};
use tempfile::TempDir;

const TEMPLATE: &str = r#"{
    "from": "The Marketing Team<marketing@example.com>",
    "subject": "A new product is being launched soon...",
    "mineType": "text/plain",
    "body": "Hi {{TITLE}} {{FIRST_NAME}} {{LAST_NAME}},\nToday, {{TODAY}}, we would like to tell you that... Sincerely,\n{{COMPANY}} {{UNKNOWN}}"
}"#;

const CUSTOMERS: &str = "TITLE,FIRST_NAME,LAST_NAME,EMAIL\n\
    Mr,John,Smith,john.smith@example.com\n\
    Mrs,Michelle,Smith,\n\
    Ms,Ann,Lee,ann.lee@example.com\n";

fn write_inputs(dir: &TempDir, customers: &str) {
    std::fs::write(dir.path().join("template.json"), TEMPLATE).unwrap();
    std::fs::write(dir.path().join("customers.csv"), customers).unwrap();
}

fn job(dir: &TempDir, extra: &str) -> TomlConfig {
    let base = dir.path().to_str().unwrap().replace('\\', "/");
    let content = format!(
        r#"
[job]
name = "launch-announcement"

[input]
template_file = "{base}/template.json"
customers_file = "{base}/customers.csv"

[output]
output_path = "{base}/out"
errors_file = "{base}/out/errors.csv"

[placeholders]
date_format = "%Y-%m-%d"

[placeholders.constants]
COMPANY = "Acme"
{extra}
"#
    );
    let config = TomlConfig::from_toml_str(&content).unwrap();
    config.validate().unwrap();
    config
}

#[tokio::test]
async fn test_end_to_end_merge_writes_emails_and_errors() {
    let temp_dir = TempDir::new().unwrap();
    write_inputs(&temp_dir, CUSTOMERS);

    let config = job(&temp_dir, "TODAY = \"2026-10-18\"");
    let pipeline = MergePipeline::new(LocalStorage::default(), config);
    let report = MergeEngine::new(pipeline).run().await.unwrap();

    assert_eq!(report.rendered, 2);
    assert_eq!(report.rejected, 1);
    assert!(report.delivery.is_none());

    let emails: Vec<Email> =
        serde_json::from_str(&std::fs::read_to_string(&report.emails_path).unwrap()).unwrap();
    assert_eq!(emails.len(), 2);
    assert_eq!(emails[0].to, "john.smith@example.com");
    assert_eq!(emails[0].from, "The Marketing Team<marketing@example.com>");
    assert_eq!(emails[0].mime_type, "text/plain");

    assert_eq!(
        emails[0].body,
        "Hi Mr John Smith,\nToday, 2026-10-18, we would like to tell you that... Sincerely,\nAcme {{UNKNOWN}}"
    );
    assert!(emails[1].body.starts_with("Hi Ms Ann Lee,"));

    let errors = std::fs::read_to_string(temp_dir.path().join("out/errors.csv")).unwrap();
    assert_eq!(errors, "TITLE,FIRST_NAME,LAST_NAME,EMAIL\nMrs,Michelle,Smith,\n");
}

#[tokio::test]
async fn test_header_only_error_report_when_all_rows_valid() {
    let temp_dir = TempDir::new().unwrap();
    write_inputs(&temp_dir, "NAME,EMAIL\nAnn,ann@example.com\n");

    let pipeline = MergePipeline::new(LocalStorage::default(), job(&temp_dir, ""));
    let report = MergeEngine::new(pipeline).run().await.unwrap();

    assert_eq!(report.rejected, 0);
    let errors = std::fs::read_to_string(&report.errors_path).unwrap();
    assert_eq!(errors, "NAME,EMAIL\n");
}

#[tokio::test]
async fn test_missing_email_column_aborts_batch() {
    let temp_dir = TempDir::new().unwrap();
    write_inputs(&temp_dir, "NAME,PHONE\nAnn,555\n");

    let pipeline = MergePipeline::new(LocalStorage::default(), job(&temp_dir, ""));
    let err = MergeEngine::new(pipeline).run().await.unwrap_err();

    assert!(matches!(err, MergeError::MissingIdentifierColumn { .. }));
    assert_eq!(err.exit_code(), 1);
    assert!(!temp_dir.path().join("out/emails.json").exists());
}

#[tokio::test]
async fn test_log_delivery_runs_after_load() {
    let temp_dir = TempDir::new().unwrap();
    write_inputs(&temp_dir, CUSTOMERS);

    let config = job(&temp_dir, "\n[delivery]\nservice = \"log\"\n");
    let service = mail_merge::adapters::delivery::configured_service(
        mail_merge::core::ConfigProvider::delivery(&config),
    )
    .unwrap()
    .unwrap();

    let pipeline = MergePipeline::new(LocalStorage::default(), config);
    let report = MergeEngine::new(pipeline)
        .with_delivery(service)
        .run()
        .await
        .unwrap();

    let statuses = report.delivery.unwrap();
    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses["ann.lee@example.com"], "logged");
    assert!(std::path::Path::new(&report.emails_path).exists());
}
