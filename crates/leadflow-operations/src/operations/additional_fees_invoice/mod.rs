mod context;
mod invoice_data;
mod operation;
mod saga_steps;

pub use invoice_data::FeesPackage;
pub use operation::{
    FeesInvoiceInput, FeesInvoiceOperation, FeesInvoiceOutcome, FeesInvoiceOutput, FeesInvoiceSkip,
    fees_invoice_step_names,
};
