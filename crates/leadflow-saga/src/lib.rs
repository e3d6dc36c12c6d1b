//! Compensating-action saga for multi-record writes against stores that have
//! no transactions.
//!
//! Each step produces an output that becomes the next step's input. The
//! output is also kept on a compensation stack: when a later step fails, every
//! completed step is compensated in reverse order with the output it produced.
//! Compensation failures are logged and collected, never allowed to stop the
//! rollback or to hide the original error.

mod audit;
mod builder;
mod erased;
mod error;
mod saga;
mod step;

pub use audit::{SagaAuditLog, StepRecord, StepStatus};
pub use builder::{Empty, HasSteps, SagaBuilder};
pub use error::{CompensationError, SagaError};
pub use saga::{Saga, Uncommitted};
pub use step::SagaStep;
