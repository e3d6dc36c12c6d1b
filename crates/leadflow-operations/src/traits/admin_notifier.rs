use async_trait::async_trait;
use leadflow_core::{ActionStatus, NotificationCategory, Priority, RecordId};

use crate::Result;

/// An entry in the admin notifications table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminNotification {
    pub priority: Priority,
    pub category: NotificationCategory,
    pub title: String,
    pub details: String,
    pub action_status: ActionStatus,
}

/// Writes notifications for the office staff.
///
/// Callers treat creation as fire-and-forget: a failure is logged and never
/// replaces the error or result being reported.
#[async_trait]
pub trait AdminNotifier: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the notification cannot be written.
    async fn create_notification(&self, notification: &AdminNotification) -> Result<RecordId>;

    /// Returns `Ok(None)` when no notification has this id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    async fn get_notification(&self, id: &RecordId) -> Result<Option<AdminNotification>>;

    /// Overwrites title, details, status and priority of a notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the notification does not exist or the write fails.
    async fn update_notification(
        &self,
        id: &RecordId,
        notification: &AdminNotification,
    ) -> Result<()>;
}
