use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to load configuration")]
    Config(#[source] leadflow_config::ConfigError),

    #[error("failed to open record store")]
    Store(#[source] leadflow_operations::OperationError),

    #[error("failed to set up webhook client")]
    Webhook(#[source] leadflow_operations::OperationError),

    #[error("lead conversion failed")]
    ConvertLead(#[source] leadflow_operations::OperationError),

    #[error("billing contact sync failed")]
    SyncContact(#[source] leadflow_operations::OperationError),

    #[error("package completion failed")]
    CompletePackage(#[source] leadflow_operations::OperationError),

    #[error("additional fees invoice failed")]
    CreateFeesInvoice(#[source] leadflow_operations::OperationError),
}

pub type Result<T> = std::result::Result<T, CliError>;
