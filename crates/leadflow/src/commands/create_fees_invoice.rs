use std::path::Path;

use leadflow_config::AppConfig;
use leadflow_operations::operations::{
    FeesInvoiceInput, FeesInvoiceOperation, FeesInvoiceOutcome, FeesInvoiceSkip,
};

use crate::error::{CliError, Result};
use crate::services::{self, Services};

pub(crate) async fn run(config: &AppConfig, store_path: &Path, package_id: String) -> Result<()> {
    let Services { store, admin } = Services::open(config, store_path).await?;
    let notifier = services::notifier(config, config.additional_fees_invoice_webhook_url())?;

    let outcome = FeesInvoiceOperation::new(store, notifier, admin, config)
        .execute(&FeesInvoiceInput {
            package_id: package_id.into(),
        })
        .await
        .map_err(CliError::CreateFeesInvoice)?;

    match outcome {
        FeesInvoiceOutcome::Skipped(FeesInvoiceSkip::NoAdditionalFees) => {
            println!("Skipped: no additional fees to invoice.");
        }
        FeesInvoiceOutcome::Skipped(FeesInvoiceSkip::AlreadyInvoiced) => {
            println!("Skipped: additional fees invoice already created.");
        }
        FeesInvoiceOutcome::Created(output) => {
            println!("paymentRecordId={}", output.payment_record_id);
            println!("invoicePdf={}", output.invoice_pdf_url);
            if let Some(id) = &output.notification_id {
                println!("notificationId={id}");
            }
        }
    }
    Ok(())
}
