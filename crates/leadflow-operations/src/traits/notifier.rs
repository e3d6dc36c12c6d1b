use async_trait::async_trait;
use serde_json::Value;

use crate::Result;

/// Successful response of a webhook call.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookAck {
    pub status: u16,
    /// Parsed JSON body; `None` when the endpoint answered with an empty body.
    pub body: Option<Value>,
}

/// Hands a payload to the external workflow engine.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Makes exactly one attempt. Retrying is the caller's concern.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-2xx status, or a body
    /// that is not valid JSON.
    async fn notify(&self, payload: &Value) -> Result<WebhookAck>;
}
