use std::sync::Arc;

use leadflow_config::{AppConfig, Schema};
use leadflow_core::RecordId;
use tracing::{error, info, warn};

use super::notifications;
use super::poll::{PollPolicy, poll_until};
use crate::error::error_chain;
use crate::traits::{AdminNotifier, RecordStore};
use crate::{OperationError, Result};

/// Poll a user's billing-contact id until the workflow engine has set it.
///
/// # Errors
///
/// Returns [`OperationError::UserNotFound`] as soon as the user is missing,
/// or [`OperationError::PollTimeout`] if the id never appears.
pub async fn wait_for_billing_contact<S>(
    store: &S,
    schema: &Schema,
    user_id: &RecordId,
    policy: &PollPolicy,
) -> Result<String>
where
    S: RecordStore + ?Sized,
{
    let users = &schema.users;
    poll_until(
        move || async move {
            let user = store
                .get_record(&users.table, user_id)
                .await?
                .ok_or_else(|| OperationError::UserNotFound(user_id.clone()))?;
            Ok(user.text(&users.billing_contact_id).map(str::to_string))
        },
        policy,
    )
    .await
}

#[derive(Debug, Clone)]
pub struct SyncBillingContactInput {
    /// User the billing contact is created for (`userIdForXero`).
    pub user_id: RecordId,
    /// Pending conversion notification to complete (`notificationId`).
    pub notification_id: RecordId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncBillingContactOutput {
    pub billing_contact_id: String,
}

/// Second stage of a deferred conversion: waits for the billing-contact id
/// and completes the conversion's admin notification.
pub struct SyncBillingContactOperation<S, A> {
    store: Arc<S>,
    admin: Arc<A>,
    schema: Arc<Schema>,
    poll: PollPolicy,
}

impl<S, A> SyncBillingContactOperation<S, A>
where
    S: RecordStore,
    A: AdminNotifier,
{
    pub fn new(store: Arc<S>, admin: Arc<A>, config: &AppConfig) -> Self {
        Self {
            store,
            admin,
            schema: Arc::new(config.schema().clone()),
            poll: config.polling().into(),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the id never appears, the user is missing, or the
    /// notification cannot be completed. A polling failure is also written
    /// onto the notification, best-effort.
    pub async fn execute(&self, input: &SyncBillingContactInput) -> Result<SyncBillingContactOutput> {
        info!(
            user_id = %input.user_id,
            notification_id = %input.notification_id,
            "waiting for billing contact id"
        );
        match wait_for_billing_contact(&*self.store, &self.schema, &input.user_id, &self.poll).await
        {
            Ok(billing_contact_id) => {
                info!(
                    user_id = %input.user_id,
                    billing_contact_id = %billing_contact_id,
                    "billing contact id found"
                );
                self.complete_notification(&input.notification_id, &billing_contact_id)
                    .await?;
                Ok(SyncBillingContactOutput { billing_contact_id })
            }
            Err(err) => {
                error!(user_id = %input.user_id, error = %err, "billing contact sync failed");
                self.escalate_notification(input, &err).await;
                Err(err)
            }
        }
    }

    async fn complete_notification(&self, id: &RecordId, billing_contact_id: &str) -> Result<()> {
        let pending = self
            .admin
            .get_notification(id)
            .await?
            .ok_or_else(|| OperationError::NotificationNotFound(id.clone()))?;
        let synced = notifications::billing_contact_synced(&pending, billing_contact_id);
        self.admin.update_notification(id, &synced).await
    }

    async fn escalate_notification(&self, input: &SyncBillingContactInput, err: &OperationError) {
        let pending = match self.admin.get_notification(&input.notification_id).await {
            Ok(Some(pending)) => pending,
            Ok(None) => {
                warn!(notification_id = %input.notification_id, "notification to escalate not found");
                return;
            }
            Err(e) => {
                warn!(error = %e, "could not read notification to escalate");
                return;
            }
        };
        let escalated =
            notifications::billing_contact_sync_failed(&pending, &input.user_id, &error_chain(err));
        if let Err(e) = self
            .admin
            .update_notification(&input.notification_id, &escalated)
            .await
        {
            warn!(error = %e, "could not escalate notification");
        }
    }
}
