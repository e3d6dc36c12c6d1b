use std::path::PathBuf;

use leadflow_core::RecordId;
use leadflow_saga::SagaError;
use thiserror::Error;

/// Details about a failed compensation during saga rollback.
#[derive(Debug)]
pub struct CompensationFailure {
    /// Name of the step whose compensation failed.
    pub step: String,
    /// Description of what the compensation was trying to do.
    pub description: String,
    /// The error that occurred during compensation.
    pub error: Box<OperationError>,
}

#[derive(Debug, Error)]
pub enum OperationError {
    #[error(transparent)]
    Core(#[from] leadflow_core::CoreError),

    #[error(transparent)]
    Config(#[from] leadflow_config::ConfigError),

    #[error("lead '{0}' not found")]
    LeadNotFound(RecordId),

    #[error("user '{0}' not found")]
    UserNotFound(RecordId),

    #[error("admin notification '{0}' not found")]
    NotificationNotFound(RecordId),

    #[error("tutoring package '{0}' not found")]
    PackageNotFound(RecordId),

    #[error("tutoring package '{0}' has no billing contact id")]
    MissingBillingContact(RecordId),

    #[error("record '{id}' not found in table '{table}'")]
    RecordNotFound { table: String, id: RecordId },

    #[error("conversion finished without creating the {record}")]
    MissingCreatedRecord { record: &'static str },

    #[error("record store rejected the request: {0}")]
    StoreRejected(String),

    #[error("lead validation failed")]
    Validation(#[from] crate::operations::ValidationErrors),

    #[error("failed to build webhook client")]
    WebhookClient(#[source] reqwest::Error),

    #[error("webhook request failed")]
    WebhookTransport(#[source] reqwest::Error),

    #[error("webhook returned HTTP {status}: {body}")]
    WebhookStatus { status: u16, body: String },

    #[error("webhook response is not valid JSON")]
    WebhookResponse(#[source] serde_json::Error),

    #[error("webhook call failed after {attempts} attempt(s)")]
    NotifierExhausted {
        attempts: u32,
        #[source]
        source: Box<OperationError>,
    },

    #[error("value still missing after {attempts} poll attempt(s)")]
    PollTimeout { attempts: u32 },

    #[error("failed to read record store '{path}'")]
    StoreRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write record store '{path}'")]
    StoreWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse record store '{path}'")]
    StoreParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize record store")]
    StoreSerialize(#[source] serde_json::Error),

    #[error("saga failed at step '{step}'")]
    SagaFailed {
        step: String,
        #[source]
        source: Box<OperationError>,
    },

    #[error(
        "saga failed at step '{step}' and {} compensation(s) also failed", compensation_failures.len()
    )]
    SagaCompensationFailed {
        step: String,
        #[source]
        source: Box<OperationError>,
        compensation_failures: Vec<CompensationFailure>,
    },
}

pub type Result<T> = std::result::Result<T, OperationError>;

impl OperationError {
    /// Whether the error came out of a saga, in which case every
    /// record it created has been rolled back (or a compensation failure was
    /// reported).
    #[must_use]
    pub fn is_rolled_back(&self) -> bool {
        matches!(
            self,
            Self::SagaFailed { .. } | Self::SagaCompensationFailed { .. }
        )
    }
}

impl From<SagaError<OperationError>> for OperationError {
    fn from(err: SagaError<OperationError>) -> Self {
        let (step, step_error, compensation_errors) = err.into_parts();
        let source = Box::new(step_error);

        if compensation_errors.is_empty() {
            return Self::SagaFailed { step, source };
        }

        let compensation_failures = compensation_errors
            .into_iter()
            .map(|e| CompensationFailure {
                step: e.step,
                description: e.description,
                error: Box::new(e.error),
            })
            .collect();
        Self::SagaCompensationFailed {
            step,
            source,
            compensation_failures,
        }
    }
}

/// Render an error and its `source()` chain on one line.
#[must_use]
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
