mod admin_notifications;
mod http_notifier;
mod json_file;
mod memory;

pub use admin_notifications::StoreAdminNotifier;
pub use http_notifier::HttpNotifier;
pub use json_file::JsonFileRecordStore;
pub use memory::{MemoryRecordStore, TableSnapshot};
