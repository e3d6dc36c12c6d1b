use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use leadflow_config::schema::PackageSchema;
use leadflow_config::{AppConfig, Schema};
use leadflow_core::{FieldValue, Record, RecordId};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use super::notifications::{self, PackageSummary};
use super::notify::{RetryPolicy, notify_with_retry};
use crate::error::error_chain;
use crate::traits::{AdminNotifier, Notifier, RecordStore};
use crate::{OperationError, Result};

const COMPLETED_STATUS: &str = "Completed";
const PAID_STATUS: &str = "Paid";

#[derive(Debug, Clone)]
pub struct PackageCompletionInput {
    pub package_id: RecordId,
}

/// Downstream workflows a completed package still needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageWorkflows {
    pub update_base_invoice: bool,
    pub generate_package_report: bool,
    pub create_additional_fees_invoice: bool,
    pub send_client_completion_email: bool,
    pub update_tutor_bill: bool,
    pub create_self_billed_invoice: bool,
    pub send_tutor_completion_email: bool,
}

impl PackageWorkflows {
    fn evaluate(package: &PackageSnapshot) -> Self {
        let invoice_updated = package.invoice_updated_at.is_some();
        let report_generated = package.package_report_generated_at.is_some();
        let bill_updated = package.bill_updated_at.is_some();
        Self {
            update_base_invoice: !invoice_updated && package.xero_invoice_id.is_some(),
            generate_package_report: !report_generated,
            create_additional_fees_invoice: package.additional_fees_invoice_created_at.is_none()
                && package.has_additional_fees(),
            send_client_completion_email: package.client_completion_email_sent_at.is_none()
                && invoice_updated
                && report_generated,
            update_tutor_bill: !bill_updated && package.xero_bill_id.is_some(),
            create_self_billed_invoice: bill_updated,
            send_tutor_completion_email: package.tutor_completion_email_sent_at.is_none()
                && bill_updated,
        }
    }

    /// Display names of the workflows that will run, in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        [
            (self.update_base_invoice, "Update Base Invoice"),
            (self.generate_package_report, "Generate Package Report"),
            (
                self.create_additional_fees_invoice,
                "Create Additional Fees Invoice",
            ),
            (
                self.send_client_completion_email,
                "Send Client Completion Email",
            ),
            (self.update_tutor_bill, "Update Tutor Bill"),
            (self.create_self_billed_invoice, "Create Self-Billed Invoice"),
            (
                self.send_tutor_completion_email,
                "Send Tutor Completion Email",
            ),
        ]
        .into_iter()
        .filter_map(|(enabled, name)| enabled.then_some(name))
        .collect()
    }
}

/// Variant of the client completion email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EmailTemplate {
    /// Paid, no additional fees.
    #[serde(rename = "TEMPLATE_A")]
    A,
    /// Paid, with additional fees.
    #[serde(rename = "TEMPLATE_B")]
    B,
    /// Unpaid, no additional fees.
    #[serde(rename = "TEMPLATE_C")]
    C,
    /// Unpaid, with additional fees.
    #[serde(rename = "TEMPLATE_D")]
    D,
}

impl EmailTemplate {
    #[must_use]
    pub fn select(paid: bool, has_fees: bool) -> Self {
        match (paid, has_fees) {
            (true, false) => Self::A,
            (true, true) => Self::B,
            (false, false) => Self::C,
            (false, true) => Self::D,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "TEMPLATE_A",
            Self::B => "TEMPLATE_B",
            Self::C => "TEMPLATE_C",
            Self::D => "TEMPLATE_D",
        }
    }
}

impl fmt::Display for EmailTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Package fields handed to the workflow engine.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct PackageSnapshot {
    record_id: RecordId,
    package_id: Option<String>,
    package_status: Option<String>,
    completion_date: Option<String>,
    package_invoice_status: Option<String>,
    xero_invoice_id: Option<String>,
    invoice_updated_at: Option<String>,
    package_report_generated_at: Option<String>,
    additional_fees_invoice_created_at: Option<String>,
    transportation_reimbursement: f64,
    late_cancellation_fees: f64,
    over_delivered_hours: f64,
    client_completion_email_sent_at: Option<String>,
    xero_bill_id: Option<String>,
    bill_updated_at: Option<String>,
    tutor_completion_email_sent_at: Option<String>,
    tutor_name: Option<String>,
    student_name: Option<String>,
}

impl PackageSnapshot {
    fn read(schema: &PackageSchema, record: &Record) -> Self {
        let text = |field: &str| field_text(record, field);
        Self {
            record_id: record.id.clone(),
            package_id: text(&schema.package_id),
            package_status: text(&schema.package_status),
            completion_date: text(&schema.completion_date),
            package_invoice_status: text(&schema.invoice_status),
            xero_invoice_id: text(&schema.accounting_invoice_id),
            invoice_updated_at: text(&schema.invoice_updated_at),
            package_report_generated_at: text(&schema.report_generated_at),
            additional_fees_invoice_created_at: text(&schema.additional_fees_invoice_created_at),
            transportation_reimbursement: record.number(&schema.transportation_reimbursement),
            late_cancellation_fees: record.number(&schema.late_cancellation_fees),
            over_delivered_hours: record.number(&schema.over_delivered_hours),
            client_completion_email_sent_at: text(&schema.client_completion_email_sent_at),
            xero_bill_id: text(&schema.accounting_bill_id),
            bill_updated_at: text(&schema.bill_updated_at),
            tutor_completion_email_sent_at: text(&schema.tutor_completion_email_sent_at),
            tutor_name: text(&schema.tutor_name),
            student_name: text(&schema.student_name),
        }
    }

    fn is_completed(&self) -> bool {
        self.package_status.as_deref() == Some(COMPLETED_STATUS)
    }

    fn is_paid(&self) -> bool {
        self.package_invoice_status.as_deref() == Some(PAID_STATUS)
    }

    fn has_additional_fees(&self) -> bool {
        self.transportation_reimbursement > 0.0
            || self.late_cancellation_fees > 0.0
            || self.over_delivered_hours > 0.0
    }
}

/// Text, select and timestamp fields as text; timestamps in RFC 3339.
fn field_text(record: &Record, field: &str) -> Option<String> {
    match record.get(field)? {
        FieldValue::DateTime(at) => Some(at.to_rfc3339()),
        _ => record.text(field).map(str::to_string),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageCompletionOutput {
    pub workflows: PackageWorkflows,
    pub email_template: EmailTemplate,
    /// Success notification, when it could be written.
    pub notification_id: Option<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageCompletionOutcome {
    /// The package is not marked completed.
    Skipped,
    Triggered(PackageCompletionOutput),
}

/// Hands a completed tutoring package to the workflow engine, naming the
/// invoicing, reporting and email workflows it still needs.
pub struct PackageCompletionOperation<S, N, A> {
    store: Arc<S>,
    notifier: Arc<N>,
    admin: Arc<A>,
    schema: Arc<Schema>,
    retry: RetryPolicy,
}

impl<S, N, A> PackageCompletionOperation<S, N, A>
where
    S: RecordStore,
    N: Notifier,
    A: AdminNotifier,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, admin: Arc<A>, config: &AppConfig) -> Self {
        Self {
            store,
            notifier,
            admin,
            schema: Arc::new(config.schema().clone()),
            retry: config.retry().into(),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the package is missing or the webhook stays
    /// unreachable. Every error is also reported as an urgent admin
    /// notification.
    pub async fn execute(&self, input: &PackageCompletionInput) -> Result<PackageCompletionOutcome> {
        info!(package_id = %input.package_id, "processing package completion");
        match self.run(&input.package_id).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                error!(package_id = %input.package_id, error = %error_chain(&err), "package completion failed");
                let notification =
                    notifications::package_workflow_failed(&input.package_id, &error_chain(&err));
                if let Err(e) = self.admin.create_notification(&notification).await {
                    warn!(error = %e, "could not create failure notification");
                }
                Err(err)
            }
        }
    }

    async fn run(&self, package_id: &RecordId) -> Result<PackageCompletionOutcome> {
        let packages = &self.schema.packages;
        let record = self
            .store
            .get_record(&packages.table, package_id)
            .await?
            .ok_or_else(|| OperationError::PackageNotFound(package_id.clone()))?;
        let package = PackageSnapshot::read(packages, &record);

        if !package.is_completed() {
            info!(package_id = %package_id, "package not completed, nothing to do");
            return Ok(PackageCompletionOutcome::Skipped);
        }

        let workflows = PackageWorkflows::evaluate(&package);
        let email_template = EmailTemplate::select(package.is_paid(), package.has_additional_fees());
        let workflow_names = workflows.names();
        info!(
            package_id = %package_id,
            workflows = ?workflow_names,
            email_template = %email_template,
            "sending package to workflow engine"
        );

        let payload = json!({
            "packageRecordId": package_id,
            "processedAt": Utc::now().to_rfc3339(),
            "workflows": workflows,
            "emailTemplate": email_template,
            "package": package,
        });
        notify_with_retry(&*self.notifier, &payload, &self.retry).await?;

        let summary = PackageSummary {
            package_id: package.package_id.as_deref().unwrap_or(package_id.as_str()),
            tutor_name: package.tutor_name.as_deref().unwrap_or("Unknown"),
            student_name: package.student_name.as_deref().unwrap_or("Unknown"),
            completion_date: package.completion_date.as_deref().unwrap_or("Unknown"),
            workflows: &workflow_names,
            email_template: email_template.as_str(),
        };
        let notification_id = match self
            .admin
            .create_notification(&notifications::package_workflow_triggered(&summary))
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, "could not create package notification");
                None
            }
        };

        Ok(PackageCompletionOutcome::Triggered(PackageCompletionOutput {
            workflows,
            email_template,
            notification_id,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use leadflow_config::RetrySettings;
    use leadflow_core::{Fields, NotificationCategory, Priority};

    use super::*;
    use crate::mocks::{MockAdminNotifier, MockNotifier};
    use crate::providers::MemoryRecordStore;

    fn config() -> AppConfig {
        AppConfig::default().with_retry(RetrySettings {
            max_attempts: 2,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(10),
            request_timeout: Duration::from_secs(1),
        })
    }

    fn package(fields: &[(&str, FieldValue)]) -> Fields {
        let mut all = Fields::new();
        all.insert("Package ID".to_string(), FieldValue::text("PKG-001"));
        all.insert("Package Status".to_string(), FieldValue::select("Completed"));
        for (name, value) in fields {
            all.insert((*name).to_string(), value.clone());
        }
        all
    }

    fn snapshot(fields: &[(&str, FieldValue)]) -> PackageSnapshot {
        let record = Record::new(RecordId::new("recPkg"), package(fields));
        PackageSnapshot::read(&PackageSchema::default(), &record)
    }

    #[test]
    fn fresh_package_only_needs_report() {
        let workflows = PackageWorkflows::evaluate(&snapshot(&[]));

        assert_eq!(workflows.names(), vec!["Generate Package Report"]);
    }

    #[test]
    fn invoice_and_report_done_unlock_client_email() {
        let workflows = PackageWorkflows::evaluate(&snapshot(&[
            ("Invoice Updated At", FieldValue::text("2026-10-01")),
            ("Package Report Generated At", FieldValue::text("2026-10-02")),
            ("Xero Invoice ID", FieldValue::text("INV-1")),
        ]));

        assert!(!workflows.update_base_invoice);
        assert!(!workflows.generate_package_report);
        assert!(workflows.send_client_completion_email);
    }

    #[test]
    fn updated_bill_unlocks_tutor_workflows() {
        let workflows = PackageWorkflows::evaluate(&snapshot(&[
            ("Xero Bill ID", FieldValue::text("BILL-1")),
            ("Bill Updated At", FieldValue::text("2026-10-03")),
        ]));

        assert!(!workflows.update_tutor_bill);
        assert!(workflows.create_self_billed_invoice);
        assert!(workflows.send_tutor_completion_email);
    }

    #[test]
    fn any_positive_fee_requires_fees_invoice() {
        let workflows = PackageWorkflows::evaluate(&snapshot(&[(
            "Over-Delivered Hours",
            FieldValue::Number(1.5),
        )]));
        assert!(workflows.create_additional_fees_invoice);

        let workflows = PackageWorkflows::evaluate(&snapshot(&[
            ("Accrued Late Cancellation Fees", FieldValue::Number(40.0)),
            (
                "Additional Fees Invoice Created At",
                FieldValue::text("2026-10-04"),
            ),
        ]));
        assert!(!workflows.create_additional_fees_invoice);
    }

    #[test]
    fn template_follows_payment_and_fees() {
        assert_eq!(EmailTemplate::select(true, false), EmailTemplate::A);
        assert_eq!(EmailTemplate::select(true, true), EmailTemplate::B);
        assert_eq!(EmailTemplate::select(false, false), EmailTemplate::C);
        assert_eq!(EmailTemplate::select(false, true), EmailTemplate::D);
    }

    #[tokio::test]
    async fn incomplete_package_is_skipped() -> anyhow::Result<()> {
        let mut fields = package(&[]);
        fields.insert("Package Status".to_string(), FieldValue::select("Active"));
        let store = Arc::new(MemoryRecordStore::new().with_record("Tutoring Packages", "recPkg", fields));
        let notifier = Arc::new(MockNotifier::succeeding());
        let operation = PackageCompletionOperation::new(
            store,
            Arc::clone(&notifier),
            Arc::new(MockAdminNotifier::new()),
            &config(),
        );

        let outcome = operation
            .execute(&PackageCompletionInput {
                package_id: RecordId::new("recPkg"),
            })
            .await?;

        assert_eq!(outcome, PackageCompletionOutcome::Skipped);
        assert_eq!(notifier.call_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn completed_package_is_sent_with_workflows() -> anyhow::Result<()> {
        let store = Arc::new(MemoryRecordStore::new().with_record(
            "Tutoring Packages",
            "recPkg",
            package(&[
                ("Package Invoice Status", FieldValue::select("Paid")),
                ("Accrued Transportation Reimbursement", FieldValue::Number(12.0)),
            ]),
        ));
        let notifier = Arc::new(MockNotifier::succeeding());
        let admin = Arc::new(MockAdminNotifier::new());
        let operation = PackageCompletionOperation::new(
            store,
            Arc::clone(&notifier),
            Arc::clone(&admin),
            &config(),
        );

        let outcome = operation
            .execute(&PackageCompletionInput {
                package_id: RecordId::new("recPkg"),
            })
            .await?;

        let PackageCompletionOutcome::Triggered(output) = outcome else {
            anyhow::bail!("expected workflows to be triggered");
        };
        assert_eq!(output.email_template, EmailTemplate::B);
        assert!(output.workflows.create_additional_fees_invoice);

        let payloads = notifier.payloads();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0]["packageRecordId"], "recPkg");
        assert_eq!(payloads[0]["emailTemplate"], "TEMPLATE_B");
        assert_eq!(payloads[0]["workflows"]["generatePackageReport"], true);
        assert_eq!(payloads[0]["package"]["packageId"], "PKG-001");

        let notifications = admin.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].category, NotificationCategory::Packages);
        assert!(notifications[0].title.ends_with("PKG-001"));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_webhook_is_reported() {
        let store = Arc::new(MemoryRecordStore::new().with_record(
            "Tutoring Packages",
            "recPkg",
            package(&[]),
        ));
        let notifier = Arc::new(MockNotifier::always_failing());
        let admin = Arc::new(MockAdminNotifier::new());
        let operation = PackageCompletionOperation::new(
            store,
            Arc::clone(&notifier),
            Arc::clone(&admin),
            &config(),
        );

        let err = operation
            .execute(&PackageCompletionInput {
                package_id: RecordId::new("recPkg"),
            })
            .await
            .expect_err("webhook never succeeds");

        assert!(matches!(err, OperationError::NotifierExhausted { attempts: 2, .. }));
        assert_eq!(notifier.call_count(), 2);
        let notifications = admin.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].priority, Priority::Urgent);
        assert!(notifications[0].details.contains("Package Record ID: recPkg"));
    }

    #[tokio::test]
    async fn missing_package_is_reported() {
        let admin = Arc::new(MockAdminNotifier::new());
        let operation = PackageCompletionOperation::new(
            Arc::new(MemoryRecordStore::new()),
            Arc::new(MockNotifier::succeeding()),
            Arc::clone(&admin),
            &config(),
        );

        let err = operation
            .execute(&PackageCompletionInput {
                package_id: RecordId::new("recGone"),
            })
            .await
            .expect_err("package is missing");

        assert!(matches!(err, OperationError::PackageNotFound(_)));
        assert_eq!(admin.notifications().len(), 1);
    }
}
