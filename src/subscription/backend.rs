//! REST client for the backend that stores subscriptions.

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;

use crate::notify::PushSubscriptionCredential;
use crate::session::SessionProbe;

#[async_trait]
pub trait SubscriptionBackend: Send + Sync {
    /// Store `credential` for `user_id`. Any non-success response is an error.
    async fn publish_subscription(
        &self,
        user_id: i64,
        token: &str,
        credential: &PushSubscriptionCredential,
    ) -> Result<(), Error>;
}

#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SubscriptionBackend for HttpBackend {
    async fn publish_subscription(
        &self,
        user_id: i64,
        token: &str,
        credential: &PushSubscriptionCredential,
    ) -> Result<(), Error> {
        tracing::debug!("Sending subscription to server for user: {}", user_id);
        let url = format!("{}/notifications/subscribe/{}", self.base_url, user_id);
        let resp = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(credential)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        // The backend usually explains itself in a JSON `message`
        let message = resp
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| "no error message".to_string());
        Err(anyhow!("Failed to save subscription ({}): {}", status, message))
    }
}

#[async_trait]
impl SessionProbe for HttpBackend {
    async fn session_is_valid(&self, user_id: i64, token: &str) -> Result<bool, Error> {
        let url = format!("{}/notifications/{}", self.base_url, user_id);
        let resp = self.client.get(url).bearer_auth(token).send().await?;
        Ok(resp.status().is_success())
    }
}
