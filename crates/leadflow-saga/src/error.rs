use std::fmt::Debug;

use thiserror::Error;

/// Error from a failed compensation operation.
#[derive(Debug, Error)]
#[error("compensation failed for step '{step}': {description}")]
pub struct CompensationError<E> {
    /// Name of the step whose compensation failed.
    pub step: String,
    /// Description of what the compensation was trying to do.
    pub description: String,
    /// The underlying error.
    #[source]
    pub error: E,
}

/// Error from saga execution.
///
/// The error that triggered the rollback is always preserved, whether or not
/// the rollback itself completed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SagaError<E: Debug> {
    /// A step failed and all compensations succeeded.
    #[error("step '{step}' failed")]
    StepFailed {
        /// Name of the step that failed.
        step: String,
        /// The error that caused the step to fail.
        #[source]
        source: E,
    },

    /// A step failed and some compensations also failed.
    #[error("step '{failed_step}' failed, and {} compensation(s) also failed", compensation_errors.len())]
    CompensationFailed {
        /// Name of the step that originally failed.
        failed_step: String,
        /// The error from the failed step.
        step_error: E,
        /// Errors from failed compensations, in the order they were attempted.
        compensation_errors: Vec<CompensationError<E>>,
    },
}

impl<E: Debug> SagaError<E> {
    /// Name of the step (or post-saga stage) whose failure started the rollback.
    #[must_use]
    pub fn failed_step(&self) -> &str {
        match self {
            Self::StepFailed { step, .. } => step,
            Self::CompensationFailed { failed_step, .. } => failed_step,
        }
    }

    /// The error that started the rollback.
    #[must_use]
    pub fn step_error(&self) -> &E {
        match self {
            Self::StepFailed { source, .. } => source,
            Self::CompensationFailed { step_error, .. } => step_error,
        }
    }

    /// Whether every compensation ran successfully.
    #[must_use]
    pub fn is_fully_compensated(&self) -> bool {
        matches!(self, Self::StepFailed { .. })
    }

    /// Split into the failed step name, its error, and any compensation
    /// errors (empty when the rollback completed).
    #[must_use]
    pub fn into_parts(self) -> (String, E, Vec<CompensationError<E>>) {
        match self {
            Self::StepFailed { step, source } => (step, source, Vec::new()),
            Self::CompensationFailed {
                failed_step,
                step_error,
                compensation_errors,
            } => (failed_step, step_error, compensation_errors),
        }
    }
}
