use std::path::Path;

use leadflow_config::AppConfig;
use leadflow_operations::operations::{SyncBillingContactInput, SyncBillingContactOperation};

use crate::error::{CliError, Result};
use crate::services::Services;

pub(crate) async fn run(
    config: &AppConfig,
    store_path: &Path,
    user_id: String,
    notification_id: String,
) -> Result<()> {
    let Services { store, admin } = Services::open(config, store_path).await?;

    let output = SyncBillingContactOperation::new(store, admin, config)
        .execute(&SyncBillingContactInput {
            user_id: user_id.into(),
            notification_id: notification_id.into(),
        })
        .await
        .map_err(CliError::SyncContact)?;

    println!("xeroContactId={}", output.billing_contact_id);
    Ok(())
}
