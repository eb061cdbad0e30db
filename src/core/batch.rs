use crate::core::resolver::Resolver;
use crate::core::template::{ScanMode, Scanner, TemplateError};
use crate::domain::model::{CustomerBatch, Email, EmailTemplate, Record};
use crate::utils::error::{MergeError, Result};

/// Default identifying column in the customers file.
pub const DEFAULT_ID_FIELD: &str = "EMAIL";

/// Builds records from raw rows. Rows with an empty or missing identifying
/// value are kept verbatim in `rejected_rows`; cells past the header width are
/// ignored.
pub fn partition_rows(
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    id_field: &str,
) -> Result<CustomerBatch> {
    let id_index = header
        .iter()
        .rposition(|column| column == id_field)
        .ok_or_else(|| MergeError::MissingIdentifierColumn {
            column: id_field.to_string(),
        })?;

    let mut batch = CustomerBatch {
        header,
        ..CustomerBatch::default()
    };

    for row in rows {
        let has_id = row.get(id_index).is_some_and(|value| !value.is_empty());
        if !has_id {
            tracing::debug!(row = ?row, "row has no '{}' value, diverting to error report", id_field);
            batch.rejected_rows.push(row);
            continue;
        }

        let record: Record = batch
            .header
            .iter()
            .cloned()
            .zip(row)
            .collect();
        batch.records.push(record);
    }

    Ok(batch)
}

/// Renders one email per record. The body is scanned once and the result
/// reused for every record.
pub fn render_emails(
    template: &EmailTemplate,
    records: &[Record],
    id_field: &str,
    resolver: &Resolver<'_>,
    mode: ScanMode,
) -> std::result::Result<Vec<Email>, TemplateError> {
    let parsed = Scanner::new(mode).scan(&template.body)?;
    tracing::debug!(
        placeholders = ?parsed.names(),
        skeleton = %parsed.skeleton(),
        "scanned template body"
    );

    Ok(records
        .iter()
        .map(|record| Email {
            from: template.from.clone(),
            to: record.get(id_field).unwrap_or_default().to_string(),
            subject: template.subject.clone(),
            mime_type: template.mime_type.clone(),
            body: resolver.resolve(&parsed, &record.data),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resolver::{ComputedValues, TODAY};

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn template(body: &str) -> EmailTemplate {
        EmailTemplate {
            from: "news@example.com".to_string(),
            subject: "October update".to_string(),
            mime_type: "text/plain".to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_partition_diverts_rows_without_id() {
        let header = strings(&["TITLE", "FIRST_NAME", "EMAIL"]);
        let rows = vec![
            strings(&["Mr", "John", "john@example.com"]),
            strings(&["Mrs", "Michelle", ""]),
            strings(&["Ms", "Ann"]),
            strings(&["Dr", "Bo", "bo@example.com"]),
        ];

        let batch = partition_rows(header, rows, DEFAULT_ID_FIELD).unwrap();

        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.records[0].get("FIRST_NAME"), Some("John"));
        assert_eq!(batch.records[1].get("EMAIL"), Some("bo@example.com"));
        assert_eq!(
            batch.error_report(),
            vec![
                strings(&["TITLE", "FIRST_NAME", "EMAIL"]),
                strings(&["Mrs", "Michelle", ""]),
                strings(&["Ms", "Ann"]),
            ]
        );
    }

    #[test]
    fn test_partition_whitespace_id_is_kept() {
        let batch = partition_rows(
            strings(&["EMAIL"]),
            vec![strings(&[" "])],
            DEFAULT_ID_FIELD,
        )
        .unwrap();
        assert_eq!(batch.records.len(), 1);
        assert!(batch.rejected_rows.is_empty());
    }

    #[test]
    fn test_partition_ignores_extra_cells() {
        let batch = partition_rows(
            strings(&["EMAIL", "NAME"]),
            vec![strings(&["a@example.com", "Ann", "surplus"])],
            DEFAULT_ID_FIELD,
        )
        .unwrap();
        assert_eq!(batch.records[0].data.len(), 2);
    }

    #[test]
    fn test_partition_requires_id_column() {
        let err = partition_rows(strings(&["NAME"]), vec![], DEFAULT_ID_FIELD).unwrap_err();
        assert!(matches!(
            err,
            MergeError::MissingIdentifierColumn { column } if column == "EMAIL"
        ));
    }

    #[test]
    fn test_partition_custom_id_field() {
        let batch = partition_rows(
            strings(&["PHONE", "NAME"]),
            vec![strings(&["", "Ann"]), strings(&["555-0100", "Bo"])],
            "PHONE",
        )
        .unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.rejected_rows.len(), 1);
    }

    #[test]
    fn test_render_emails_copies_metadata() {
        let computed = ComputedValues::new().with_constant(TODAY, "18 Oct 2026");
        let resolver = Resolver::new(&computed);
        let records: Vec<Record> = vec![
            [("EMAIL", "ann@example.com"), ("NAME", "Ann")].into_iter().collect(),
            [("EMAIL", "bo@example.com")].into_iter().collect(),
        ];

        let emails = render_emails(
            &template("Hi {{NAME}}, {{TODAY}}"),
            &records,
            DEFAULT_ID_FIELD,
            &resolver,
            ScanMode::Lenient,
        )
        .unwrap();

        assert_eq!(emails.len(), 2);
        assert_eq!(emails[0].to, "ann@example.com");
        assert_eq!(emails[0].from, "news@example.com");
        assert_eq!(emails[0].subject, "October update");
        assert_eq!(emails[0].mime_type, "text/plain");
        assert_eq!(emails[0].body, "Hi Ann, 18 Oct 2026");
        assert_eq!(emails[1].body, "Hi {{NAME}}, 18 Oct 2026");
    }

    #[test]
    fn test_render_emails_subject_not_templated() {
        let computed = ComputedValues::new();
        let resolver = Resolver::new(&computed);
        let mut tpl = template("body");
        tpl.subject = "Hello {{NAME}}".to_string();
        let records: Vec<Record> = vec![[("EMAIL", "a@example.com"), ("NAME", "Ann")]
            .into_iter()
            .collect()];

        let emails =
            render_emails(&tpl, &records, DEFAULT_ID_FIELD, &resolver, ScanMode::Lenient).unwrap();
        assert_eq!(emails[0].subject, "Hello {{NAME}}");
    }

    #[test]
    fn test_render_emails_strict_mode_rejects_unterminated() {
        let computed = ComputedValues::new();
        let resolver = Resolver::new(&computed);

        let result = render_emails(
            &template("Hi {{NAME"),
            &[],
            DEFAULT_ID_FIELD,
            &resolver,
            ScanMode::Strict,
        );
        assert_eq!(
            result.unwrap_err(),
            TemplateError::UnterminatedPlaceholder { offset: 3 }
        );
    }
}
