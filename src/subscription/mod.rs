//! Subscription manager: the one-time handshake that registers the agent,
//! obtains a push subscription and hands its credentials to the backend.
//!
//! Push is an optional enhancement, so every step degrades to `false`
//! (or `None`) with a log line instead of returning an error.

pub mod backend;
pub use backend::{HttpBackend, SubscriptionBackend};

use std::sync::Arc;

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;

use crate::core::AppConfig;
use crate::notify::PushSubscriptionCredential;
use crate::notify::codec::{encode_key, url_b64_to_bytes};
use crate::platform::{
    AgentRegistration, BrowserSubscription, PageRuntime, Permission, SubscribeOptions,
};
use crate::session::PushLifecycle;

pub struct SubscriptionManager {
    runtime: Arc<dyn PageRuntime>,
    backend: Arc<dyn SubscriptionBackend>,
    vapid_public_key: String,
    agent_script: String,
}

impl SubscriptionManager {
    pub fn new(
        runtime: Arc<dyn PageRuntime>,
        backend: Arc<dyn SubscriptionBackend>,
        vapid_public_key: &str,
        agent_script: &str,
    ) -> Self {
        Self {
            runtime,
            backend,
            vapid_public_key: vapid_public_key.to_string(),
            agent_script: agent_script.to_string(),
        }
    }

    pub fn from_config(
        runtime: Arc<dyn PageRuntime>,
        backend: Arc<dyn SubscriptionBackend>,
        config: &AppConfig,
    ) -> Self {
        Self::new(runtime, backend, &config.vapid_public_key, &config.agent_script)
    }

    pub fn is_push_supported(&self) -> bool {
        self.runtime.capabilities().supports_push()
    }

    pub fn current_permission(&self) -> Permission {
        self.runtime.permission()
    }

    pub async fn register_agent(&self) -> Option<Arc<dyn AgentRegistration>> {
        if !self.runtime.capabilities().service_worker {
            tracing::warn!("Service worker not supported");
            return None;
        }

        match self.runtime.register_agent(&self.agent_script).await {
            Ok(registration) => {
                tracing::info!("Service worker registered: {}", registration.scope());
                Some(registration)
            }
            Err(e) => {
                tracing::error!("Service worker registration failed: {}", e);
                None
            }
        }
    }

    pub async fn request_permission(&self) -> Permission {
        if !self.runtime.capabilities().notifications {
            tracing::warn!("Notifications not supported");
            return Permission::Denied;
        }

        let permission = self.runtime.request_permission().await;
        tracing::info!("Notification permission: {:?}", permission);
        permission
    }

    /// Return the registration's subscription, creating one only if none
    /// exists yet.
    pub async fn subscribe(
        &self,
        registration: &dyn AgentRegistration,
    ) -> Option<BrowserSubscription> {
        match self.get_or_create_subscription(registration).await {
            Ok(subscription) => {
                tracing::info!("Push subscription ready: {}", subscription.endpoint);
                Some(subscription)
            }
            Err(e) => {
                tracing::error!("Push subscription failed: {}", e);
                None
            }
        }
    }

    async fn get_or_create_subscription(
        &self,
        registration: &dyn AgentRegistration,
    ) -> Result<BrowserSubscription, Error> {
        if let Some(existing) = registration.get_subscription().await? {
            return Ok(existing);
        }

        let options = SubscribeOptions {
            user_visible_only: true,
            application_server_key: url_b64_to_bytes(&self.vapid_public_key)?,
        };
        registration.subscribe(&options).await
    }

    pub async fn send_subscription_to_server(
        &self,
        subscription: &BrowserSubscription,
        user_id: i64,
        token: &str,
    ) -> bool {
        let credential = match to_credential(subscription) {
            Ok(credential) => credential,
            Err(e) => {
                tracing::error!("{}", e);
                return false;
            }
        };

        match self
            .backend
            .publish_subscription(user_id, token, &credential)
            .await
        {
            Ok(()) => {
                tracing::info!("Subscription saved to server");
                true
            }
            Err(e) => {
                tracing::error!("Error sending subscription to server: {}", e);
                false
            }
        }
    }

    /// Run the whole handshake for `user_id`. `true` only when the backend
    /// accepted the credential.
    pub async fn setup_push_notifications(&self, user_id: i64, token: &str) -> bool {
        if !self.is_push_supported() {
            tracing::warn!("Push notifications not supported by this runtime");
            return false;
        }

        let Some(registration) = self.register_agent().await else {
            return false;
        };

        let permission = self.request_permission().await;
        if permission != Permission::Granted {
            tracing::warn!("Notification permission not granted");
            return false;
        }

        let Some(subscription) = self.subscribe(registration.as_ref()).await else {
            return false;
        };

        self.send_subscription_to_server(&subscription, user_id, token)
            .await
    }

    /// Cancel this browser's subscription once the agent is ready. The
    /// backend is not told.
    pub async fn unsubscribe_from_push(&self) -> bool {
        match self.try_unsubscribe().await {
            Ok(true) => {
                tracing::info!("Unsubscribed from push notifications");
                true
            }
            Ok(false) => false,
            Err(e) => {
                tracing::error!("Error unsubscribing: {}", e);
                false
            }
        }
    }

    async fn try_unsubscribe(&self) -> Result<bool, Error> {
        let registration = self.runtime.agent_ready().await?;
        match registration.get_subscription().await? {
            Some(subscription) => registration.unsubscribe(&subscription).await,
            None => Ok(false),
        }
    }
}

/// Base64-encode the subscription keys for transport.
pub fn to_credential(
    subscription: &BrowserSubscription,
) -> Result<PushSubscriptionCredential, Error> {
    let (Some(p256dh), Some(auth)) = (&subscription.p256dh, &subscription.auth) else {
        return Err(anyhow!("Missing subscription keys"));
    };

    Ok(PushSubscriptionCredential {
        endpoint: subscription.endpoint.clone(),
        p256dh: encode_key(p256dh),
        auth: encode_key(auth),
    })
}

#[async_trait]
impl PushLifecycle for SubscriptionManager {
    async fn setup(&self, user_id: i64, token: &str) -> bool {
        self.setup_push_notifications(user_id, token).await
    }

    async fn teardown(&self) -> bool {
        self.unsubscribe_from_push().await
    }

    async fn register(&self) -> bool {
        self.register_agent().await.is_some()
    }
}
