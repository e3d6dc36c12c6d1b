use std::path::Path;

use leadflow_config::AppConfig;
use leadflow_operations::operations::{
    PackageCompletionInput, PackageCompletionOperation, PackageCompletionOutcome,
};

use crate::error::{CliError, Result};
use crate::services::{self, Services};

pub(crate) async fn run(config: &AppConfig, store_path: &Path, package_id: String) -> Result<()> {
    let Services { store, admin } = Services::open(config, store_path).await?;
    let notifier = services::notifier(config, config.package_completion_webhook_url())?;

    let outcome = PackageCompletionOperation::new(store, notifier, admin, config)
        .execute(&PackageCompletionInput {
            package_id: package_id.into(),
        })
        .await
        .map_err(CliError::CompletePackage)?;

    match outcome {
        PackageCompletionOutcome::Skipped => println!("Skipped: package is not completed."),
        PackageCompletionOutcome::Triggered(output) => {
            println!("emailTemplate={}", output.email_template);
            let workflows = output.workflows.names();
            if workflows.is_empty() {
                println!("No workflows to run.");
            }
            for workflow in workflows {
                println!("  ✓ {workflow}");
            }
            if let Some(id) = &output.notification_id {
                println!("notificationId={id}");
            }
        }
    }
    Ok(())
}
