mod complete_package;
mod convert_lead;
mod create_fees_invoice;
mod sync_contact;

use std::path::Path;

use clap::Subcommand;
use leadflow_config::AppConfig;

use crate::error::Result;

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Convert a lead whose "Convert to Client" box is ticked
    ConvertLead {
        /// Record id of the lead
        lead_id: String,

        /// Wait for the Xero contact id before finishing
        #[arg(long)]
        wait_for_external_id: bool,
    },
    /// Wait for a converted user's Xero contact id and complete its notification
    SyncContact {
        /// User the contact is created for (`userIdForXero`)
        #[arg(long)]
        user_id: String,

        /// Pending conversion notification (`notificationId`)
        #[arg(long)]
        notification_id: String,
    },
    /// Hand a completed tutoring package to the workflow engine
    CompletePackage {
        /// Record id of the tutoring package
        package_id: String,
    },
    /// Create the additional fees invoice of a completed tutoring package
    CreateFeesInvoice {
        /// Record id of the tutoring package
        package_id: String,
    },
}

impl Commands {
    pub(crate) async fn execute(self, config: &AppConfig, store_path: &Path) -> Result<()> {
        match self {
            Self::ConvertLead {
                lead_id,
                wait_for_external_id,
            } => {
                let config = if wait_for_external_id {
                    config.clone().with_wait_for_external_id(true)
                } else {
                    config.clone()
                };
                convert_lead::run(&config, store_path, lead_id).await
            }
            Self::SyncContact {
                user_id,
                notification_id,
            } => sync_contact::run(config, store_path, user_id, notification_id).await,
            Self::CompletePackage { package_id } => {
                complete_package::run(config, store_path, package_id).await
            }
            Self::CreateFeesInvoice { package_id } => {
                create_fees_invoice::run(config, store_path, package_id).await
            }
        }
    }
}
