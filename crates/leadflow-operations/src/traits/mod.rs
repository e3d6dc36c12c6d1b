mod admin_notifier;
mod notifier;
mod record_store;

pub use admin_notifier::{AdminNotification, AdminNotifier};
pub use notifier::{Notifier, WebhookAck};
pub use record_store::RecordStore;
