//! Titles and bodies of the admin notifications the operations write.

use chrono::{DateTime, FixedOffset, Utc};
use leadflow_core::{ActionStatus, NotificationCategory, Priority, RecordId};

use crate::traits::AdminNotification;

const PENDING_MARKER: &str = "Pending Xero ID - ";
const CONVERTED_PREFIX: &str = "✅ Lead Converted";
const PENDING_NOTE: &str =
    "NOTE: The Xero Contact ID will be retrieved and added to this notification by the polling script.";

/// Format `at` in the office's local time, e.g. `October 19, 2026, 02:30 PM`.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>, utc_offset_minutes: i32) -> String {
    let local = FixedOffset::east_opt(utc_offset_minutes * 60)
        .map_or_else(|| at.fixed_offset(), |offset| at.with_timezone(&offset));
    local.format("%B %-d, %Y, %I:%M %p").to_string()
}

/// Facts about a finished conversion that go into its notification.
pub(crate) struct ConversionSummary<'a> {
    pub lead_name: &'a str,
    pub lead_type: &'a str,
    pub records: &'a str,
    pub user_id: &'a RecordId,
    pub converted_at: &'a str,
}

pub(crate) fn conversion_pending(summary: &ConversionSummary<'_>) -> AdminNotification {
    let ConversionSummary {
        lead_name,
        lead_type,
        records,
        user_id,
        converted_at,
    } = summary;
    AdminNotification {
        priority: Priority::Regular,
        category: NotificationCategory::Leads,
        title: format!("{CONVERTED_PREFIX} - {PENDING_MARKER}{lead_name}"),
        details: format!(
            "Lead successfully converted to client. Xero Contact ID will be added shortly.\n\n\
             Lead: {lead_name}\n\
             Lead Type: {lead_type}\n\
             Created Records:\n{records}\n\n\
             User ID for Xero Contact: {user_id}\n\n\
             Converted At: {converted_at}\n\n\
             {PENDING_NOTE}"
        ),
        action_status: ActionStatus::Pending,
    }
}

pub(crate) fn conversion_completed(
    summary: &ConversionSummary<'_>,
    billing_contact_id: &str,
) -> AdminNotification {
    let ConversionSummary {
        lead_name,
        lead_type,
        records,
        user_id,
        converted_at,
    } = summary;
    AdminNotification {
        priority: Priority::Regular,
        category: NotificationCategory::Leads,
        title: format!("{CONVERTED_PREFIX} Successfully - {lead_name}"),
        details: format!(
            "Lead successfully converted to client.\n\n\
             Lead: {lead_name}\n\
             Lead Type: {lead_type}\n\
             Created Records:\n{records}\n\n\
             User ID for Xero Contact: {user_id}\n\
             Xero Contact ID: {billing_contact_id}\n\n\
             Converted At: {converted_at}"
        ),
        action_status: ActionStatus::Completed,
    }
}

pub(crate) fn conversion_failed(
    lead_id: &RecordId,
    lead_name: &str,
    lead_type: &str,
    error: &str,
) -> AdminNotification {
    AdminNotification {
        priority: Priority::Urgent,
        category: NotificationCategory::SystemError,
        title: format!("🚨 ERROR: Lead Conversion Failed - {lead_name}"),
        details: format!(
            "Failed to convert lead to client.\n\n\
             Lead: {lead_name}\n\
             Lead ID: {lead_id}\n\
             Lead Type: {lead_type}\n\
             Error: {error}\n\n\
             Action Required: Review error and manually convert if needed."
        ),
        action_status: ActionStatus::Pending,
    }
}

/// Rewrite a pending conversion notification once the id is known.
pub(crate) fn billing_contact_synced(
    pending: &AdminNotification,
    billing_contact_id: &str,
) -> AdminNotification {
    let title = pending.title.replace(PENDING_MARKER, "").replacen(
        CONVERTED_PREFIX,
        &format!("{CONVERTED_PREFIX} - Xero ID: {billing_contact_id}"),
        1,
    );
    let details = pending.details.replace(
        PENDING_NOTE,
        &format!(
            "Xero Contact ID: {billing_contact_id}\n\n\
             Xero Contact ID retrieved and added successfully."
        ),
    );
    AdminNotification {
        title,
        details,
        action_status: ActionStatus::Completed,
        ..pending.clone()
    }
}

/// Escalate a pending conversion notification after polling gave up.
pub(crate) fn billing_contact_sync_failed(
    pending: &AdminNotification,
    user_id: &RecordId,
    error: &str,
) -> AdminNotification {
    AdminNotification {
        priority: Priority::Urgent,
        details: format!(
            "{}\n\n⚠️ POLLING ERROR:\n{error}\n\n\
             The Xero Contact ID may need to be added manually. Please check the \
             workflow webhook logs and the Users table for User ID: {user_id}",
            pending.details
        ),
        action_status: ActionStatus::Pending,
        ..pending.clone()
    }
}

/// Facts about a package whose completion workflows were handed off.
pub(crate) struct PackageSummary<'a> {
    pub package_id: &'a str,
    pub tutor_name: &'a str,
    pub student_name: &'a str,
    pub completion_date: &'a str,
    pub workflows: &'a [&'static str],
    pub email_template: &'a str,
}

pub(crate) fn package_workflow_triggered(summary: &PackageSummary<'_>) -> AdminNotification {
    let workflows = summary
        .workflows
        .iter()
        .map(|workflow| format!("✓ {workflow}"))
        .collect::<Vec<_>>()
        .join("\n");
    let PackageSummary {
        package_id,
        tutor_name,
        student_name,
        completion_date,
        email_template,
        ..
    } = summary;
    AdminNotification {
        priority: Priority::Regular,
        category: NotificationCategory::Packages,
        title: format!("✅ Package Completion Workflow Triggered - {package_id}"),
        details: format!(
            "Package completion workflows have been triggered.\n\n\
             Package: {package_id}\n\
             Tutor: {tutor_name}\n\
             Student: {student_name}\n\
             Completion Date: {completion_date}\n\n\
             Workflows to Execute:\n{workflows}\n\n\
             Email Template: {email_template}"
        ),
        action_status: ActionStatus::Completed,
    }
}

pub(crate) fn package_workflow_failed(package_record_id: &RecordId, error: &str) -> AdminNotification {
    AdminNotification {
        priority: Priority::Urgent,
        category: NotificationCategory::SystemError,
        title: "🚨 ERROR: Package Completion Workflow Failed".to_string(),
        details: format!(
            "Failed to trigger package completion workflows.\n\n\
             Package Record ID: {package_record_id}\n\
             Error: {error}\n\n\
             Action Required: Review error and trigger workflows manually if needed."
        ),
        action_status: ActionStatus::Pending,
    }
}

/// Facts about a created additional-fees invoice.
pub(crate) struct InvoiceSummary<'a> {
    pub package_id: &'a str,
    pub student_name: &'a str,
    pub payment_record_id: &'a RecordId,
    pub total_amount: f64,
    pub over_delivered_hours: f64,
    pub hourly_lesson_rate: f64,
    pub transportation_reimbursement: f64,
    pub late_cancellation_fees: f64,
    pub adjustment: f64,
}

pub(crate) fn additional_fees_invoice_created(summary: &InvoiceSummary<'_>) -> AdminNotification {
    let InvoiceSummary {
        package_id,
        student_name,
        payment_record_id,
        total_amount,
        over_delivered_hours,
        hourly_lesson_rate,
        transportation_reimbursement,
        late_cancellation_fees,
        adjustment,
    } = summary;
    AdminNotification {
        priority: Priority::Regular,
        category: NotificationCategory::Packages,
        title: format!("✅ Additional Fees Invoice Created - {package_id}"),
        details: format!(
            "Additional fees invoice successfully created in Xero.\n\n\
             Package: {package_id}\n\
             Student: {student_name}\n\
             Payment Record ID: {payment_record_id}\n\
             Total Amount: {total_amount}\n\n\
             Breakdown:\n\
             - Over-Delivered Hours: {over_delivered_hours} @ {hourly_lesson_rate}\n\
             - Transportation Reimbursement: {transportation_reimbursement}\n\
             - Late Cancellation Fees: {late_cancellation_fees}\n\
             - Adjustment: {adjustment}"
        ),
        action_status: ActionStatus::Completed,
    }
}

pub(crate) fn additional_fees_invoice_failed(
    package_record_id: &RecordId,
    error: &str,
) -> AdminNotification {
    AdminNotification {
        priority: Priority::Urgent,
        category: NotificationCategory::SystemError,
        title: "🚨 CRITICAL ERROR: Additional Fees Invoice Failed".to_string(),
        details: format!(
            "Failed to create additional fees invoice.\n\n\
             Package Record ID: {package_record_id}\n\
             Error: {error}\n\n\
             Action Required: URGENT - Review error and manually create invoice in Xero."
        ),
        action_status: ActionStatus::Pending,
    }
}
