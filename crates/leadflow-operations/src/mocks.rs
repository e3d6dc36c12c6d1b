//! In-memory doubles for the notifier seams.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use indexmap::IndexMap;
use leadflow_core::{ActionStatus, NotificationCategory, Priority, RecordId};
use serde_json::{Value, json};

use crate::traits::{AdminNotification, AdminNotifier, Notifier, WebhookAck};
use crate::{OperationError, Result};

/// Notifier that fails a fixed number of times before acknowledging.
pub struct MockNotifier {
    failures_left: AtomicU32,
    calls: AtomicU32,
    payloads: Mutex<Vec<Value>>,
}

impl MockNotifier {
    pub fn succeeding() -> Self {
        Self::failing_times(0)
    }

    pub fn failing_times(failures: u32) -> Self {
        Self {
            failures_left: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
            payloads: Mutex::new(Vec::new()),
        }
    }

    pub fn always_failing() -> Self {
        Self::failing_times(u32::MAX)
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn payloads(&self) -> Vec<Value> {
        self.payloads.lock().expect("payload lock").clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, payload: &Value) -> Result<WebhookAck> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payloads
            .lock()
            .expect("payload lock")
            .push(payload.clone());

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                left.checked_sub(1)
            })
            .is_ok();
        if failing {
            return Err(OperationError::WebhookStatus {
                status: 500,
                body: "boom".to_string(),
            });
        }
        Ok(WebhookAck {
            status: 200,
            body: Some(json!({ "ok": true })),
        })
    }
}

/// Admin notifier keeping notifications in memory, keyed by id.
#[derive(Default)]
pub struct MockAdminNotifier {
    notifications: Mutex<IndexMap<RecordId, AdminNotification>>,
    failing: bool,
}

impl MockAdminNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with a store error.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with_notification(self, id: &str, notification: AdminNotification) -> Self {
        self.notifications
            .lock()
            .expect("notification lock")
            .insert(RecordId::new(id), notification);
        self
    }

    pub fn notification(&self, id: &str) -> Option<AdminNotification> {
        self.notifications
            .lock()
            .expect("notification lock")
            .get(&RecordId::new(id))
            .cloned()
    }

    pub fn notifications(&self) -> Vec<AdminNotification> {
        self.notifications
            .lock()
            .expect("notification lock")
            .values()
            .cloned()
            .collect()
    }

    fn check(&self) -> Result<()> {
        if self.failing {
            return Err(OperationError::StoreRejected(
                "notifications table unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl AdminNotifier for MockAdminNotifier {
    async fn create_notification(&self, notification: &AdminNotification) -> Result<RecordId> {
        self.check()?;
        let mut notifications = self.notifications.lock().expect("notification lock");
        let id = RecordId::new(format!("recNotif{}", notifications.len() + 1));
        notifications.insert(id.clone(), notification.clone());
        Ok(id)
    }

    async fn get_notification(&self, id: &RecordId) -> Result<Option<AdminNotification>> {
        self.check()?;
        Ok(self
            .notifications
            .lock()
            .expect("notification lock")
            .get(id)
            .cloned())
    }

    async fn update_notification(
        &self,
        id: &RecordId,
        notification: &AdminNotification,
    ) -> Result<()> {
        self.check()?;
        let mut notifications = self.notifications.lock().expect("notification lock");
        let slot = notifications
            .get_mut(id)
            .ok_or_else(|| OperationError::NotificationNotFound(id.clone()))?;
        *slot = notification.clone();
        Ok(())
    }
}

/// A conversion notification still waiting for its billing-contact id.
pub fn pending_notification() -> AdminNotification {
    AdminNotification {
        priority: Priority::Regular,
        category: NotificationCategory::Leads,
        title: "✅ Lead Converted - Pending Xero ID - Jane Doe".to_string(),
        details: "Lead successfully converted to client. Xero Contact ID will be added shortly.\n\n\
                  Lead: Jane Doe\n\n\
                  NOTE: The Xero Contact ID will be retrieved and added to this notification by the polling script."
            .to_string(),
        action_status: ActionStatus::Pending,
    }
}
