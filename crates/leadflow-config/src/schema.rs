//! Table and field names of the record store.
//!
//! The defaults are the names used by the production base. Every struct
//! deserialises with `#[serde(default)]` so a config file only needs to name
//! the fields that differ.

use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Schema {
    pub leads: LeadSchema,
    pub users: UserSchema,
    pub parents: ParentSchema,
    pub students: StudentSchema,
    pub notifications: NotificationSchema,
    pub packages: PackageSchema,
    pub payments: PaymentSchema,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LeadSchema {
    pub table: String,
    pub convert_to_client: String,
    pub lead_type: String,
    pub lead_status: String,
    pub parent_first_name: String,
    pub parent_last_name: String,
    pub parent_email: String,
    pub parent_phone: String,
    pub student_first_name: String,
    pub student_last_name: String,
    pub student_email: String,
    pub student_phone: String,
    pub grade_year: String,
    pub learning_preferences: String,
    pub academic_goals: String,
    pub special_accommodations: String,
    pub preferred_days_times: String,
    pub preferred_frequency: String,
    pub preferred_modes: String,
    pub converted_at: String,
    pub link_to_parents: String,
    pub link_to_students: String,
    pub link_to_users: String,
}

impl Default for LeadSchema {
    fn default() -> Self {
        Self {
            table: "Leads".into(),
            convert_to_client: "Convert to Client".into(),
            lead_type: "Lead Type".into(),
            lead_status: "Lead Status".into(),
            parent_first_name: "Parent First Name".into(),
            parent_last_name: "Parent Last Name".into(),
            parent_email: "Parent Email".into(),
            parent_phone: "Parent Phone".into(),
            student_first_name: "Student First Name".into(),
            student_last_name: "Student Last Name".into(),
            student_email: "Student Email".into(),
            student_phone: "Student Phone".into(),
            grade_year: "Grade/Year".into(),
            learning_preferences: "Learning Preferences".into(),
            academic_goals: "Academic Goals".into(),
            special_accommodations: "Special Accommodations".into(),
            preferred_days_times: "Preferred Days and Times".into(),
            preferred_frequency: "Preferred Frequency".into(),
            preferred_modes: "Preferred Modes".into(),
            converted_at: "Converted At".into(),
            link_to_parents: "Link to Parents".into(),
            link_to_students: "Link to Students".into(),
            link_to_users: "Link to Users".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UserSchema {
    pub table: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub status: String,
    pub billing_contact_id: String,
    pub link_to_parent_record: String,
    pub link_to_student_record: String,
}

impl Default for UserSchema {
    fn default() -> Self {
        Self {
            table: "Users".into(),
            first_name: "First Name".into(),
            last_name: "Last Name".into(),
            email: "Email".into(),
            phone: "Phone".into(),
            role: "Role".into(),
            status: "Status".into(),
            billing_contact_id: "Xero Contact ID".into(),
            link_to_parent_record: "Link to Parent Record".into(),
            link_to_student_record: "Link to Student Record".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParentSchema {
    pub table: String,
    pub user: String,
}

impl Default for ParentSchema {
    fn default() -> Self {
        Self {
            table: "Parents".into(),
            user: "User ID".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StudentSchema {
    pub table: String,
    pub user: String,
    pub parents: String,
    pub grade_year: String,
    pub learning_preferences: String,
    pub academic_goals: String,
    pub special_accommodations: String,
    pub preferred_days_times: String,
    pub preferred_frequency: String,
    pub preferred_modes: String,
}

impl Default for StudentSchema {
    fn default() -> Self {
        Self {
            table: "Students".into(),
            user: "User ID".into(),
            parents: "Parents".into(),
            grade_year: "Grade/Year".into(),
            learning_preferences: "Learning Preferences".into(),
            academic_goals: "Academic Goals".into(),
            special_accommodations: "Special Accommodations".into(),
            preferred_days_times: "Preferred Days and Times".into(),
            preferred_frequency: "Preferred Frequency".into(),
            preferred_modes: "Preferred Modes".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotificationSchema {
    pub table: String,
    pub assigned_to: String,
    pub priority: String,
    pub category: String,
    pub title: String,
    pub details: String,
    pub action_status: String,
}

impl Default for NotificationSchema {
    fn default() -> Self {
        Self {
            table: "Admin Notifications".into(),
            assigned_to: "Assigned To".into(),
            priority: "Priority".into(),
            category: "Notification Category".into(),
            title: "Title".into(),
            details: "Details".into(),
            action_status: "Action Status".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackageSchema {
    pub table: String,
    pub package_id: String,
    pub package_status: String,
    pub completion_date: String,
    pub invoice_status: String,
    pub accounting_invoice_id: String,
    pub invoice_updated_at: String,
    pub report_generated_at: String,
    pub additional_fees_invoice_created_at: String,
    pub transportation_reimbursement: String,
    pub late_cancellation_fees: String,
    pub over_delivered_hours: String,
    pub client_completion_email_sent_at: String,
    pub accounting_bill_id: String,
    pub bill_updated_at: String,
    pub tutor_completion_email_sent_at: String,
    pub tutor_name: String,
    pub student_name: String,
    pub billing_contact_id: String,
    pub subjects: String,
    pub modes: String,
    pub hourly_session_rate: String,
    pub hourly_lesson_rate: String,
    pub confirmation_date: String,
    pub fees_invoice_adjustment: String,
    pub fees_invoice_adjustment_note: String,
    pub fees_invoice_total: String,
}

impl Default for PackageSchema {
    fn default() -> Self {
        Self {
            table: "Tutoring Packages".into(),
            package_id: "Package ID".into(),
            package_status: "Package Status".into(),
            completion_date: "Completion Date".into(),
            invoice_status: "Package Invoice Status".into(),
            accounting_invoice_id: "Xero Invoice ID".into(),
            invoice_updated_at: "Invoice Updated At".into(),
            report_generated_at: "Package Report Generated At".into(),
            additional_fees_invoice_created_at: "Additional Fees Invoice Created At".into(),
            transportation_reimbursement: "Accrued Transportation Reimbursement".into(),
            late_cancellation_fees: "Accrued Late Cancellation Fees".into(),
            over_delivered_hours: "Over-Delivered Hours".into(),
            client_completion_email_sent_at: "Client Package Completion Email Sent At".into(),
            accounting_bill_id: "Xero Bill ID".into(),
            bill_updated_at: "Bill Updated At".into(),
            tutor_completion_email_sent_at: "Tutor Package Completion Email Sent At".into(),
            tutor_name: "Tutor Name".into(),
            student_name: "Student Name".into(),
            billing_contact_id: "Student/Parent Xero Contact ID".into(),
            subjects: "Subject(s)".into(),
            modes: "Mode(s)".into(),
            hourly_session_rate: "Hourly Session Rate".into(),
            hourly_lesson_rate: "Hourly Lesson Rate".into(),
            confirmation_date: "Confirmation Date".into(),
            fees_invoice_adjustment: "Additional Fees Invoice Adjustment".into(),
            fees_invoice_adjustment_note: "Additional Fees Invoice Adjustment Note".into(),
            fees_invoice_total: "Total Additional Fees Invoice Amount".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaymentSchema {
    pub table: String,
    pub payment_type: String,
    pub tutoring_package: String,
    pub invoice_id: String,
    pub invoice_pdf: String,
}

impl Default for PaymentSchema {
    fn default() -> Self {
        Self {
            table: "Payments".into(),
            payment_type: "Payment Type".into(),
            tutoring_package: "Tutoring Package".into(),
            invoice_id: "Xero Invoice ID".into(),
            invoice_pdf: "Invoice PDF".into(),
        }
    }
}
