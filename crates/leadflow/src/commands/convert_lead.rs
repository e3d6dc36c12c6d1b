use std::path::Path;

use leadflow_config::AppConfig;
use leadflow_operations::operations::{
    ConversionOutcome, ConversionOutput, ConvertLeadInput, ConvertLeadOperation, SkipReason,
};

use crate::error::{CliError, Result};
use crate::services::{self, Services};

pub(crate) async fn run(config: &AppConfig, store_path: &Path, lead_id: String) -> Result<()> {
    let Services { store, admin } = Services::open(config, store_path).await?;
    let notifier = services::notifier(config, config.convert_lead_webhook_url())?;

    let operation = ConvertLeadOperation::new(store, notifier, admin, config);
    let outcome = operation
        .execute(&ConvertLeadInput {
            lead_id: lead_id.into(),
        })
        .await
        .map_err(CliError::ConvertLead)?;

    match outcome {
        ConversionOutcome::Skipped(SkipReason::TriggerNotSet) => {
            println!("Skipped: \"Convert to Client\" is not ticked.");
        }
        ConversionOutcome::Skipped(SkipReason::AlreadyConverted) => {
            println!("Skipped: lead is already converted.");
        }
        ConversionOutcome::Converted(output) => print_conversion(&output),
    }
    Ok(())
}

fn print_conversion(output: &ConversionOutput) {
    println!("userIdForXero={}", output.user_id_for_billing);
    if let Some(id) = &output.notification_id {
        println!("notificationId={id}");
    }
    if let Some(id) = &output.billing_contact_id {
        println!("xeroContactId={id}");
    }
}
