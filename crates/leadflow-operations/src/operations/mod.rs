mod additional_fees_invoice;
mod convert_lead;
pub mod notifications;
mod notify;
mod package_completion;
mod poll;
mod sync_billing_contact;

pub use additional_fees_invoice::{
    FeesInvoiceInput, FeesInvoiceOperation, FeesInvoiceOutcome, FeesInvoiceOutput, FeesInvoiceSkip,
    FeesPackage, fees_invoice_step_names,
};
pub use convert_lead::{
    ContactDetails, ConversionOutcome, ConversionOutput, ConvertLeadInput, ConvertLeadOperation, conversion_step_names,
    CreatedRecords, LeadPlan, LeadValidator, SkipReason, StudentProfile,
    WAIT_FOR_BILLING_CONTACT_STAGE, ValidationError, ValidationErrors,
};
pub use notify::{RetryPolicy, notify_with_retry};
pub use package_completion::{
    EmailTemplate, PackageCompletionInput, PackageCompletionOperation, PackageCompletionOutcome,
    PackageCompletionOutput, PackageWorkflows,
};
pub use poll::{PollPolicy, poll_until};
pub use sync_billing_contact::{
    SyncBillingContactInput, SyncBillingContactOperation, SyncBillingContactOutput,
    wait_for_billing_contact,
};
