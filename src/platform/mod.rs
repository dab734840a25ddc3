//! Host runtime seams.
//!
//! The page context and the background agent context are separate event
//! loops that only talk through messages. Each side sees the platform
//! through the traits below; a browser binding or an in-memory fake
//! implements them.

use std::sync::Arc;

use anyhow::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::notify::{NotificationOptions, RelayMessage};

/// Notification permission as reported by the runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
    /// The user dismissed the prompt or was never asked.
    Default,
}

/// The three platform features push notifications depend on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub service_worker: bool,
    pub push_manager: bool,
    pub notifications: bool,
}

impl Capabilities {
    pub fn all() -> Self {
        Self {
            service_worker: true,
            push_manager: true,
            notifications: true,
        }
    }

    pub fn supports_push(&self) -> bool {
        self.service_worker && self.push_manager && self.notifications
    }
}

/// Options passed when asking the push manager for a subscription.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Every push must result in a visible notification; no silent pushes.
    pub user_visible_only: bool,
    pub application_server_key: Vec<u8>,
}

/// A subscription as the browser hands it out, with raw key material.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrowserSubscription {
    pub endpoint: String,
    pub p256dh: Option<Vec<u8>>,
    pub auth: Option<Vec<u8>>,
}

/// Page-side view of the platform.
#[async_trait]
pub trait PageRuntime: Send + Sync {
    fn capabilities(&self) -> Capabilities;

    /// Current permission without prompting.
    fn permission(&self) -> Permission;

    async fn request_permission(&self) -> Permission;

    /// Register the agent script. Registering the same script at the same
    /// scope again resolves to the existing registration.
    async fn register_agent(&self, script_url: &str) -> Result<Arc<dyn AgentRegistration>, Error>;

    /// Resolves once an agent is active and controlling this page.
    async fn agent_ready(&self) -> Result<Arc<dyn AgentRegistration>, Error>;
}

/// A registered agent and its push manager.
#[async_trait]
pub trait AgentRegistration: Send + Sync {
    fn scope(&self) -> String;

    async fn subscribe(&self, options: &SubscribeOptions) -> Result<BrowserSubscription, Error>;

    async fn get_subscription(&self) -> Result<Option<BrowserSubscription>, Error>;

    /// Cancel `subscription`. Returns whether it was still active.
    async fn unsubscribe(&self, subscription: &BrowserSubscription) -> Result<bool, Error>;
}

/// Which clients `AgentScope::match_all` should return.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClientQuery {
    pub window_only: bool,
    pub include_uncontrolled: bool,
}

/// An open page as seen from the agent.
#[async_trait]
pub trait WindowClient: Send + Sync {
    fn url(&self) -> String;

    /// Queue `message` for the page. Delivery is not acknowledged.
    fn post_message(&self, message: &RelayMessage) -> Result<(), Error>;

    async fn navigate(&self, url: &str) -> Result<(), Error>;

    async fn focus(&self) -> Result<(), Error>;
}

/// A displayed OS notification handed back on click.
pub trait ActiveNotification: Send + Sync {
    fn data(&self) -> Option<Value>;

    fn close(&self);
}

/// Agent-side view of the platform (the worker's global scope).
#[async_trait]
pub trait AgentScope: Send + Sync {
    /// Origin the agent is registered under, e.g. `https://hub.example`.
    fn origin(&self) -> String;

    async fn skip_waiting(&self) -> Result<(), Error>;

    async fn claim_clients(&self) -> Result<(), Error>;

    async fn match_all(&self, query: ClientQuery) -> Result<Vec<Arc<dyn WindowClient>>, Error>;

    async fn open_window(&self, url: &str) -> Result<(), Error>;

    async fn show_notification(
        &self,
        title: &str,
        options: &NotificationOptions,
    ) -> Result<(), Error>;
}

/// True when `url` lives under `origin`.
pub fn is_same_origin(url: &str, origin: &str) -> bool {
    let origin = origin.trim_end_matches('/');
    match url.strip_prefix(origin) {
        Some(rest) => {
            rest.is_empty() || rest.starts_with('/') || rest.starts_with('?') || rest.starts_with('#')
        }
        None => false,
    }
}
