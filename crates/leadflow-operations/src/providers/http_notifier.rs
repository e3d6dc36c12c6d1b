use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::traits::{Notifier, WebhookAck};
use crate::{OperationError, Result};

/// Longest response body kept in a status error.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Posts JSON payloads to a workflow-engine webhook.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    client: reqwest::Client,
    url: Url,
}

impl HttpNotifier {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: Url, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(OperationError::WebhookClient)?;
        Ok(Self { client, url })
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, payload: &Value) -> Result<WebhookAck> {
        debug!(url = %self.url, "posting webhook payload");
        let response = self
            .client
            .post(self.url.clone())
            .json(payload)
            .send()
            .await
            .map_err(OperationError::WebhookTransport)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(OperationError::WebhookTransport)?;

        if !status.is_success() {
            return Err(OperationError::WebhookStatus {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let body = if body.trim().is_empty() {
            None
        } else {
            Some(serde_json::from_str(&body).map_err(OperationError::WebhookResponse)?)
        };

        Ok(WebhookAck {
            status: status.as_u16(),
            body,
        })
    }
}
