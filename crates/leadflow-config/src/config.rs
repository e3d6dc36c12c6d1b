use std::path::Path;
use std::time::Duration;

use leadflow_core::RecordId;
use serde::Deserialize;
use url::Url;

use crate::error::{ConfigError, Result};
use crate::schema::Schema;

const DEFAULT_CONVERT_LEAD_WEBHOOK: &str = "http://localhost:5678/webhook/convert-lead";
const DEFAULT_CONVERT_LEAD_TEST_WEBHOOK: &str = "http://localhost:5678/webhook-test/convert-lead";
const DEFAULT_PACKAGE_WEBHOOK: &str = "http://localhost:5678/webhook/package-completion";
const DEFAULT_PACKAGE_TEST_WEBHOOK: &str = "http://localhost:5678/webhook-test/package-completion";
const DEFAULT_FEES_INVOICE_WEBHOOK: &str =
    "http://localhost:5678/webhook/create-additional-fees-invoice";
const DEFAULT_FEES_INVOICE_TEST_WEBHOOK: &str =
    "http://localhost:5678/webhook-test/create-additional-fees-invoice";

/// Production and test URLs of one external workflow webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEndpoint {
    production: Url,
    test: Url,
}

impl WebhookEndpoint {
    #[must_use]
    pub fn new(production: Url, test: Url) -> Self {
        Self { production, test }
    }

    #[must_use]
    pub fn production(&self) -> &Url {
        &self.production
    }

    #[must_use]
    pub fn test(&self) -> &Url {
        &self.test
    }

    #[must_use]
    pub fn select(&self, use_test: bool) -> &Url {
        if use_test { &self.test } else { &self.production }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    admin_user_id: Option<RecordId>,
    wait_for_external_id: bool,
    notification_utc_offset_minutes: i32,
    use_test_webhooks: bool,
    convert_lead_webhook: WebhookEndpoint,
    package_completion_webhook: WebhookEndpoint,
    fees_invoice_webhook: WebhookEndpoint,
    retry: RetrySettings,
    polling: PollSettings,
    schema: Schema,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_file(ConfigFile::default())
            .expect("built-in default configuration is valid")
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// contains invalid settings.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ConfigFile = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_file(file)
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or contains invalid
    /// settings.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content).map_err(ConfigError::ParseStr)?;
        Self::from_file(file)
    }

    fn from_file(file: ConfigFile) -> Result<Self> {
        let ConfigFile {
            admin_user_id,
            wait_for_external_id,
            notification_utc_offset_minutes,
            webhooks,
            retry,
            polling,
            schema,
        } = file;

        if retry.max_delay_ms < retry.initial_delay_ms {
            return Err(ConfigError::InvalidSetting {
                setting: "retry.max_delay_ms",
                reason: "must not be smaller than initial_delay_ms",
            });
        }
        if retry.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidSetting {
                setting: "retry.request_timeout_ms",
                reason: "must be greater than zero",
            });
        }
        if notification_utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::InvalidSetting {
                setting: "notification_utc_offset_minutes",
                reason: "must be less than one day in either direction",
            });
        }

        Ok(Self {
            admin_user_id: admin_user_id
                .filter(|id| !id.trim().is_empty())
                .map(RecordId::new),
            wait_for_external_id,
            notification_utc_offset_minutes,
            use_test_webhooks: webhooks.use_test,
            convert_lead_webhook: webhooks
                .convert_lead
                .into_endpoint("webhooks.convert_lead")?,
            package_completion_webhook: webhooks
                .package_completion
                .into_endpoint("webhooks.package_completion")?,
            fees_invoice_webhook: webhooks
                .additional_fees_invoice
                .into_endpoint("webhooks.additional_fees_invoice")?,
            retry: RetrySettings {
                max_attempts: retry.max_attempts,
                initial_delay: Duration::from_millis(retry.initial_delay_ms),
                max_delay: Duration::from_millis(retry.max_delay_ms),
                request_timeout: Duration::from_millis(retry.request_timeout_ms),
            },
            polling: PollSettings {
                max_attempts: polling.max_attempts,
                interval: Duration::from_millis(polling.interval_ms),
            },
            schema,
        })
    }

    #[must_use]
    pub fn admin_user_id(&self) -> Option<&RecordId> {
        self.admin_user_id.as_ref()
    }

    /// Whether lead conversion waits for the billing-contact id before
    /// finishing, instead of leaving it to a later sync run.
    #[must_use]
    pub fn wait_for_external_id(&self) -> bool {
        self.wait_for_external_id
    }

    #[must_use]
    pub fn notification_utc_offset_minutes(&self) -> i32 {
        self.notification_utc_offset_minutes
    }

    #[must_use]
    pub fn use_test_webhooks(&self) -> bool {
        self.use_test_webhooks
    }

    #[must_use]
    pub fn convert_lead_webhook_url(&self) -> &Url {
        self.convert_lead_webhook.select(self.use_test_webhooks)
    }

    #[must_use]
    pub fn package_completion_webhook_url(&self) -> &Url {
        self.package_completion_webhook.select(self.use_test_webhooks)
    }

    #[must_use]
    pub fn additional_fees_invoice_webhook_url(&self) -> &Url {
        self.fees_invoice_webhook.select(self.use_test_webhooks)
    }

    #[must_use]
    pub fn retry(&self) -> RetrySettings {
        self.retry
    }

    #[must_use]
    pub fn polling(&self) -> PollSettings {
        self.polling
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub fn with_use_test_webhooks(mut self, use_test: bool) -> Self {
        self.use_test_webhooks = use_test;
        self
    }

    #[must_use]
    pub fn with_wait_for_external_id(mut self, wait: bool) -> Self {
        self.wait_for_external_id = wait;
        self
    }

    #[cfg(any(test, feature = "testing"))]
    #[must_use]
    pub fn with_admin_user_id(mut self, id: Option<RecordId>) -> Self {
        self.admin_user_id = id;
        self
    }

    #[cfg(any(test, feature = "testing"))]
    #[must_use]
    pub fn with_retry(mut self, retry: RetrySettings) -> Self {
        self.retry = retry;
        self
    }

    #[cfg(any(test, feature = "testing"))]
    #[must_use]
    pub fn with_polling(mut self, polling: PollSettings) -> Self {
        self.polling = polling;
        self
    }

    #[cfg(any(test, feature = "testing"))]
    #[must_use]
    pub fn with_convert_lead_webhook(mut self, endpoint: WebhookEndpoint) -> Self {
        self.convert_lead_webhook = endpoint;
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    admin_user_id: Option<String>,
    wait_for_external_id: bool,
    notification_utc_offset_minutes: i32,
    webhooks: WebhooksSection,
    retry: RetrySection,
    polling: PollingSection,
    schema: Schema,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            admin_user_id: None,
            wait_for_external_id: false,
            // Hong Kong time
            notification_utc_offset_minutes: 8 * 60,
            webhooks: WebhooksSection::default(),
            retry: RetrySection::default(),
            polling: PollingSection::default(),
            schema: Schema::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct WebhooksSection {
    use_test: bool,
    convert_lead: EndpointSection,
    package_completion: EndpointSection,
    additional_fees_invoice: EndpointSection,
}

impl Default for WebhooksSection {
    fn default() -> Self {
        Self {
            use_test: false,
            convert_lead: EndpointSection {
                production: DEFAULT_CONVERT_LEAD_WEBHOOK.to_string(),
                test: DEFAULT_CONVERT_LEAD_TEST_WEBHOOK.to_string(),
            },
            package_completion: EndpointSection {
                production: DEFAULT_PACKAGE_WEBHOOK.to_string(),
                test: DEFAULT_PACKAGE_TEST_WEBHOOK.to_string(),
            },
            additional_fees_invoice: EndpointSection {
                production: DEFAULT_FEES_INVOICE_WEBHOOK.to_string(),
                test: DEFAULT_FEES_INVOICE_TEST_WEBHOOK.to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EndpointSection {
    production: String,
    test: String,
}

impl EndpointSection {
    fn into_endpoint(self, setting: &'static str) -> Result<WebhookEndpoint> {
        let parse = |value: String| {
            Url::parse(&value).map_err(|source| ConfigError::InvalidUrl {
                setting,
                value,
                source,
            })
        };
        Ok(WebhookEndpoint::new(parse(self.production)?, parse(self.test)?))
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RetrySection {
    max_attempts: u32,
    initial_delay_ms: u64,
    max_delay_ms: u64,
    request_timeout_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        let defaults = RetrySettings::default();
        Self {
            max_attempts: defaults.max_attempts,
            initial_delay_ms: duration_ms(defaults.initial_delay),
            max_delay_ms: duration_ms(defaults.max_delay),
            request_timeout_ms: duration_ms(defaults.request_timeout),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PollingSection {
    max_attempts: u32,
    interval_ms: u64,
}

impl Default for PollingSection {
    fn default() -> Self {
        let defaults = PollSettings::default();
        Self {
            max_attempts: defaults.max_attempts,
            interval_ms: duration_ms(defaults.interval),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() -> anyhow::Result<()> {
        let config = AppConfig::from_toml_str("")?;

        assert!(!config.wait_for_external_id());
        assert_eq!(config.retry(), RetrySettings::default());
        assert_eq!(config.polling(), PollSettings::default());
        assert_eq!(config.notification_utc_offset_minutes(), 480);
        assert!(config.admin_user_id().is_none());
        assert_eq!(
            config.convert_lead_webhook_url().as_str(),
            DEFAULT_CONVERT_LEAD_WEBHOOK
        );
        Ok(())
    }

    #[test]
    fn use_test_selects_test_endpoints() -> anyhow::Result<()> {
        let config = AppConfig::from_toml_str(
            r#"
            [webhooks]
            use_test = true
            "#,
        )?;

        assert_eq!(
            config.convert_lead_webhook_url().as_str(),
            DEFAULT_CONVERT_LEAD_TEST_WEBHOOK
        );
        assert_eq!(
            config.package_completion_webhook_url().as_str(),
            DEFAULT_PACKAGE_TEST_WEBHOOK
        );
        assert_eq!(
            config.additional_fees_invoice_webhook_url().as_str(),
            DEFAULT_FEES_INVOICE_TEST_WEBHOOK
        );
        Ok(())
    }

    #[test]
    fn override_flag_switches_endpoint_after_load() {
        let config = AppConfig::default().with_use_test_webhooks(true);

        assert_eq!(
            config.convert_lead_webhook_url().as_str(),
            DEFAULT_CONVERT_LEAD_TEST_WEBHOOK
        );
    }

    #[test]
    fn retry_and_polling_sections_override_defaults() -> anyhow::Result<()> {
        let config = AppConfig::from_toml_str(
            r#"
            wait_for_external_id = true
            admin_user_id = "usrAdmin"

            [retry]
            max_attempts = 5
            initial_delay_ms = 100
            max_delay_ms = 1000

            [polling]
            max_attempts = 15
            interval_ms = 2000
            "#,
        )?;

        assert!(config.wait_for_external_id());
        assert_eq!(config.admin_user_id(), Some(&RecordId::new("usrAdmin")));
        assert_eq!(config.retry().max_attempts, 5);
        assert_eq!(config.retry().initial_delay, Duration::from_millis(100));
        assert_eq!(config.polling().max_attempts, 15);
        assert_eq!(config.polling().interval, Duration::from_secs(2));
        Ok(())
    }

    #[test]
    fn blank_admin_user_id_is_treated_as_unset() -> anyhow::Result<()> {
        let config = AppConfig::from_toml_str(r#"admin_user_id = "  ""#)?;

        assert!(config.admin_user_id().is_none());
        Ok(())
    }

    #[test]
    fn invalid_webhook_url_is_rejected() {
        let result = AppConfig::from_toml_str(
            r#"
            [webhooks.convert_lead]
            production = "not a url"
            test = "http://localhost/test"
            "#,
        );

        let err = result.expect_err("should reject invalid URL");
        assert!(matches!(
            err,
            ConfigError::InvalidUrl {
                setting: "webhooks.convert_lead",
                ..
            }
        ));
    }

    #[test]
    fn max_delay_below_initial_delay_is_rejected() {
        let result = AppConfig::from_toml_str(
            r"
            [retry]
            initial_delay_ms = 1000
            max_delay_ms = 10
            ",
        );

        assert!(matches!(
            result,
            Err(ConfigError::InvalidSetting {
                setting: "retry.max_delay_ms",
                ..
            })
        ));
    }

    #[test]
    fn unknown_top_level_key_is_rejected() {
        let result = AppConfig::from_toml_str("retries = 3");

        assert!(matches!(result, Err(ConfigError::ParseStr(_))));
    }

    #[test]
    fn load_reads_file_from_disk() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("leadflow.toml");
        std::fs::write(&path, "wait_for_external_id = true\n")?;

        let config = AppConfig::load(&path)?;

        assert!(config.wait_for_external_id());
        Ok(())
    }

    #[test]
    fn load_reports_missing_file_path() {
        let err = AppConfig::load(Path::new("/definitely/missing/leadflow.toml"))
            .expect_err("should fail");

        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("leadflow.toml"));
    }
}
