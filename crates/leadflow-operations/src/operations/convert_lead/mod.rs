mod context;
mod operation;
mod saga_data;
mod saga_steps;
mod validator;

pub use operation::{
    ConversionOutcome, ConversionOutput, ConvertLeadInput, ConvertLeadOperation, conversion_step_names, SkipReason,
    WAIT_FOR_BILLING_CONTACT_STAGE,
};
pub use saga_data::{ContactDetails, CreatedRecords, LeadPlan, StudentProfile};
pub use validator::{LeadValidator, ValidationError, ValidationErrors};
