use chrono::{DateTime, NaiveDate};
use leadflow_config::schema::PackageSchema;
use leadflow_core::{FieldValue, Record, RecordId};
use serde::Serialize;

/// Package fields the invoice is built from, as sent to the workflow engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeesPackage {
    pub package_id: String,
    pub transportation_reimbursement: f64,
    pub late_cancellation_fees: f64,
    pub over_delivered_hours: f64,
    pub hourly_session_rate: f64,
    #[serde(rename = "additionalFeesInvoiceAdjustment")]
    pub adjustment: f64,
    #[serde(rename = "additionalFeesInvoiceAdjustmentNote")]
    pub adjustment_note: String,
    #[serde(rename = "studentParentXeroContactId")]
    pub billing_contact_id: String,
    pub tutor_name: String,
    pub student_name: String,
    pub subject: String,
    pub mode: String,
    pub hourly_lesson_rate: f64,
    /// `YYYY-MM-DD`.
    pub confirmation_date: Option<String>,
    /// `YYYY-MM-DD`.
    pub completion_date: Option<String>,
    #[serde(rename = "totalAdditionalFeesInvoiceAmount")]
    pub total_amount: f64,
}

impl FeesPackage {
    #[must_use]
    pub fn read(schema: &PackageSchema, record: &Record) -> Self {
        Self {
            package_id: record.text_or_empty(&schema.package_id),
            transportation_reimbursement: record.number(&schema.transportation_reimbursement),
            late_cancellation_fees: record.number(&schema.late_cancellation_fees),
            over_delivered_hours: record.number(&schema.over_delivered_hours),
            hourly_session_rate: record.number(&schema.hourly_session_rate),
            adjustment: record.number(&schema.fees_invoice_adjustment),
            adjustment_note: record.text_or_empty(&schema.fees_invoice_adjustment_note),
            billing_contact_id: record.text_or_empty(&schema.billing_contact_id),
            tutor_name: record.text_or_empty(&schema.tutor_name),
            student_name: record.text_or_empty(&schema.student_name),
            subject: joined(record, &schema.subjects),
            mode: joined(record, &schema.modes),
            hourly_lesson_rate: record.number(&schema.hourly_lesson_rate),
            confirmation_date: calendar_date(record, &schema.confirmation_date),
            completion_date: calendar_date(record, &schema.completion_date),
            total_amount: record.number(&schema.fees_invoice_total),
        }
    }

    #[must_use]
    pub fn has_additional_fees(&self) -> bool {
        self.transportation_reimbursement > 0.0
            || self.late_cancellation_fees > 0.0
            || self.over_delivered_hours > 0.0
    }
}

/// Multi-select options joined by commas; plain text is read as is.
fn joined(record: &Record, field: &str) -> String {
    match record.get(field) {
        Some(FieldValue::MultiSelect(options)) => options.join(", "),
        _ => record.text_or_empty(field),
    }
}

fn calendar_date(record: &Record, field: &str) -> Option<String> {
    let date = match record.get(field)? {
        FieldValue::DateTime(at) => at.date_naive(),
        _ => {
            let raw = record.text(field)?;
            DateTime::parse_from_rfc3339(raw)
                .map(|at| at.date_naive())
                .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
                .ok()?
        }
    };
    Some(date.format("%Y-%m-%d").to_string())
}

/// State carried through the invoicing saga.
#[derive(Debug, Clone)]
pub(crate) struct FeesInvoiceData {
    pub package_record_id: RecordId,
    pub package: FeesPackage,
    pub payment_record_id: Option<RecordId>,
    pub invoice_pdf_url: Option<String>,
}

impl FeesInvoiceData {
    pub fn new(package_record_id: RecordId, package: FeesPackage) -> Self {
        Self {
            package_record_id,
            package,
            payment_record_id: None,
            invoice_pdf_url: None,
        }
    }
}
