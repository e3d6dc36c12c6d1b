use std::path::Path;
use std::sync::Arc;

use leadflow_config::AppConfig;
use leadflow_operations::providers::{HttpNotifier, JsonFileRecordStore, StoreAdminNotifier};
use url::Url;

use crate::error::{CliError, Result};

pub(crate) type Store = JsonFileRecordStore;
pub(crate) type Admin = StoreAdminNotifier<Store>;

/// Record store and admin notifications shared by every command.
pub(crate) struct Services {
    pub store: Arc<Store>,
    pub admin: Arc<Admin>,
}

impl Services {
    pub(crate) async fn open(config: &AppConfig, store_path: &Path) -> Result<Self> {
        let store = Arc::new(
            JsonFileRecordStore::open(store_path)
                .await
                .map_err(CliError::Store)?,
        );
        let admin = Arc::new(StoreAdminNotifier::new(
            Arc::clone(&store),
            Arc::new(config.schema().clone()),
            config.admin_user_id().cloned(),
        ));
        Ok(Self { store, admin })
    }
}

pub(crate) fn notifier(config: &AppConfig, url: &Url) -> Result<Arc<HttpNotifier>> {
    HttpNotifier::new(url.clone(), config.retry().request_timeout)
        .map(Arc::new)
        .map_err(CliError::Webhook)
}
