use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Identifier of a row in the external record store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A file attached to a record, such as a generated invoice PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// Cell value of a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Checkbox(bool),
    Select(String),
    MultiSelect(Vec<String>),
    Links(Vec<RecordId>),
    DateTime(DateTime<Utc>),
    Attachments(Vec<Attachment>),
}

impl FieldValue {
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    #[must_use]
    pub fn select(value: impl fmt::Display) -> Self {
        Self::Select(value.to_string())
    }

    #[must_use]
    pub fn link(id: &RecordId) -> Self {
        Self::Links(vec![id.clone()])
    }
}

/// Field name to value, in insertion order.
pub type Fields = IndexMap<String, FieldValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub fields: Fields,
}

impl Record {
    #[must_use]
    pub fn new(id: RecordId, fields: Fields) -> Self {
        Self { id, fields }
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Trimmed text of a field; blank values read as absent.
    ///
    /// Select options are returned by name so free-text and single-select
    /// columns can be read the same way.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<&str> {
        let raw = match self.get(field)? {
            FieldValue::Text(s) | FieldValue::Select(s) => s.as_str(),
            _ => return None,
        };
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Trimmed text, or an empty string when absent.
    #[must_use]
    pub fn text_or_empty(&self, field: &str) -> String {
        self.text(field).unwrap_or_default().to_string()
    }

    #[must_use]
    pub fn select(&self, field: &str) -> Option<&str> {
        match self.get(field)? {
            FieldValue::Select(s) if !s.trim().is_empty() => Some(s.trim()),
            _ => None,
        }
    }

    #[must_use]
    pub fn multi_select(&self, field: &str) -> Vec<String> {
        match self.get(field) {
            Some(FieldValue::MultiSelect(values)) => values.clone(),
            _ => Vec::new(),
        }
    }

    /// Unchecked and missing checkboxes both read as `false`.
    #[must_use]
    pub fn checkbox(&self, field: &str) -> bool {
        matches!(self.get(field), Some(FieldValue::Checkbox(true)))
    }

    #[must_use]
    pub fn links(&self, field: &str) -> &[RecordId] {
        match self.get(field) {
            Some(FieldValue::Links(ids)) => ids,
            _ => &[],
        }
    }

    /// URL of the first file in an attachment field.
    #[must_use]
    pub fn first_attachment_url(&self, field: &str) -> Option<&str> {
        match self.get(field) {
            Some(FieldValue::Attachments(files)) => files.first().map(|file| file.url.as_str()),
            _ => None,
        }
    }

    /// Numeric value; missing or non-numeric fields read as zero.
    #[must_use]
    pub fn number(&self, field: &str) -> f64 {
        match self.get(field) {
            Some(FieldValue::Number(n)) => *n,
            _ => 0.0,
        }
    }

    /// Whether a field holds any non-blank value.
    #[must_use]
    pub fn is_present(&self, field: &str) -> bool {
        match self.get(field) {
            None => false,
            Some(FieldValue::Text(s) | FieldValue::Select(s)) => !s.trim().is_empty(),
            Some(FieldValue::MultiSelect(values)) => !values.is_empty(),
            Some(FieldValue::Links(ids)) => !ids.is_empty(),
            Some(FieldValue::Attachments(files)) => !files.is_empty(),
            Some(FieldValue::Checkbox(checked)) => *checked,
            Some(FieldValue::Number(_) | FieldValue::DateTime(_)) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: Vec<(&str, FieldValue)>) -> Record {
        Record::new(
            RecordId::new("rec1"),
            fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    #[test]
    fn blank_text_reads_as_absent() {
        let rec = record(vec![("Name", FieldValue::text("   "))]);

        assert_eq!(rec.text("Name"), None);
        assert!(!rec.is_present("Name"));
    }

    #[test]
    fn text_is_trimmed() {
        let rec = record(vec![("Email", FieldValue::text("  a@b.com \n"))]);

        assert_eq!(rec.text("Email"), Some("a@b.com"));
    }

    #[test]
    fn select_is_readable_as_text() {
        let rec = record(vec![("Grade", FieldValue::select("Year 10"))]);

        assert_eq!(rec.text("Grade"), Some("Year 10"));
        assert_eq!(rec.select("Grade"), Some("Year 10"));
    }

    #[test]
    fn select_does_not_read_plain_text() {
        let rec = record(vec![("Grade", FieldValue::text("Year 10"))]);

        assert_eq!(rec.select("Grade"), None);
    }

    #[test]
    fn missing_checkbox_is_false() {
        let rec = record(vec![]);

        assert!(!rec.checkbox("Convert to Client"));
    }

    #[test]
    fn links_default_to_empty() {
        let rec = record(vec![("Parents", FieldValue::text("oops"))]);

        assert!(rec.links("Parents").is_empty());
    }

    #[test]
    fn first_attachment_url_reads_attachment_fields_only() {
        let rec = record(vec![
            (
                "Invoice PDF",
                FieldValue::Attachments(vec![Attachment {
                    url: "https://files.example.com/inv-1.pdf".to_string(),
                    filename: None,
                }]),
            ),
            ("Link", FieldValue::text("https://files.example.com/other.pdf")),
            ("Empty", FieldValue::Attachments(Vec::new())),
        ]);

        assert_eq!(
            rec.first_attachment_url("Invoice PDF"),
            Some("https://files.example.com/inv-1.pdf")
        );
        assert_eq!(rec.first_attachment_url("Link"), None);
        assert_eq!(rec.first_attachment_url("Empty"), None);
        assert!(!rec.is_present("Empty"));
    }

    #[test]
    fn number_defaults_to_zero() {
        let rec = record(vec![("Fees", FieldValue::text("12"))]);

        assert!(rec.number("Fees").abs() < f64::EPSILON);
    }

    #[test]
    fn field_value_serializes_with_kind_tag() -> Result<(), serde_json::Error> {
        let json = serde_json::to_string(&FieldValue::link(&RecordId::new("recA")))?;

        assert_eq!(json, r#"{"links":["recA"]}"#);
        Ok(())
    }
}
