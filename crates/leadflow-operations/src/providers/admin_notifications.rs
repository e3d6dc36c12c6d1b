use std::sync::Arc;

use async_trait::async_trait;
use leadflow_config::Schema;
use leadflow_core::{FieldValue, Fields, RecordId};

use crate::traits::{AdminNotification, AdminNotifier, RecordStore};
use crate::{OperationError, Result};

const MAX_TITLE_CHARS: usize = 500;
const MAX_DETAILS_CHARS: usize = 10_000;

/// Writes admin notifications as rows of the notifications table.
pub struct StoreAdminNotifier<S> {
    store: Arc<S>,
    schema: Arc<Schema>,
    assignee: Option<RecordId>,
}

impl<S> StoreAdminNotifier<S>
where
    S: RecordStore,
{
    /// `assignee` is linked on every new notification when set.
    pub fn new(store: Arc<S>, schema: Arc<Schema>, assignee: Option<RecordId>) -> Self {
        Self {
            store,
            schema,
            assignee,
        }
    }

    fn content_fields(&self, notification: &AdminNotification) -> Fields {
        let names = &self.schema.notifications;
        let mut fields = Fields::new();
        fields.insert(
            names.priority.clone(),
            FieldValue::select(notification.priority),
        );
        fields.insert(
            names.category.clone(),
            FieldValue::select(notification.category),
        );
        fields.insert(
            names.title.clone(),
            FieldValue::text(truncate_chars(&notification.title, MAX_TITLE_CHARS)),
        );
        fields.insert(
            names.details.clone(),
            FieldValue::text(truncate_chars(&notification.details, MAX_DETAILS_CHARS)),
        );
        fields.insert(
            names.action_status.clone(),
            FieldValue::select(notification.action_status),
        );
        fields
    }
}

#[async_trait]
impl<S> AdminNotifier for StoreAdminNotifier<S>
where
    S: RecordStore,
{
    async fn create_notification(&self, notification: &AdminNotification) -> Result<RecordId> {
        let names = &self.schema.notifications;
        let mut fields = Fields::new();
        if let Some(assignee) = &self.assignee {
            fields.insert(names.assigned_to.clone(), FieldValue::link(assignee));
        }
        fields.extend(self.content_fields(notification));

        self.store.create_record(&names.table, fields).await
    }

    async fn get_notification(&self, id: &RecordId) -> Result<Option<AdminNotification>> {
        let names = &self.schema.notifications;
        let Some(record) = self.store.get_record(&names.table, id).await? else {
            return Ok(None);
        };

        Ok(Some(AdminNotification {
            priority: record.text_or_empty(&names.priority).parse()?,
            category: record.text_or_empty(&names.category).parse()?,
            title: record.text_or_empty(&names.title),
            details: record.text_or_empty(&names.details),
            action_status: record.text_or_empty(&names.action_status).parse()?,
        }))
    }

    async fn update_notification(
        &self,
        id: &RecordId,
        notification: &AdminNotification,
    ) -> Result<()> {
        let names = &self.schema.notifications;
        self.store
            .update_record(&names.table, id, self.content_fields(notification))
            .await
            .map_err(|e| match e {
                OperationError::RecordNotFound { id, .. } => {
                    OperationError::NotificationNotFound(id)
                }
                other => other,
            })
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
