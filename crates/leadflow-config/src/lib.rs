//! Runtime configuration for leadflow: webhook endpoints, retry and polling
//! bounds, and the immutable table/field-name schema of the record store.

mod config;
mod error;
pub mod schema;

pub use config::{AppConfig, PollSettings, RetrySettings, WebhookEndpoint};
pub use error::{ConfigError, Result};
pub use schema::Schema;

/// Environment variable naming the config file when `--config` is absent.
pub const CONFIG_PATH_ENV: &str = "LEADFLOW_CONFIG";

/// Environment variable that forces the test webhook endpoints when set.
pub const USE_TEST_WEBHOOKS_ENV: &str = "LEADFLOW_USE_TEST_WEBHOOKS";
