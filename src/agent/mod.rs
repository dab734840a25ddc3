//! Background delivery agent.
//!
//! Runs in the worker context, independent of any open page. Each entry
//! point is re-entrant and keeps no state between events apart from the
//! lifecycle phase.

use std::sync::{Arc, RwLock};

use anyhow::{Error, Result};
use serde_json::Value;

use crate::core::AgentConfig;
use crate::notify::{
    NotificationData, NotificationDefaults, NotificationOptions, NotificationPayload, RelayMessage,
};
use crate::platform::{ActiveNotification, AgentScope, ClientQuery, is_same_origin};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentPhase {
    Uninstalled,
    Installing,
    Activating,
    Active,
}

/// Events the host dispatches to the agent.
pub enum AgentEvent {
    Install,
    Activate,
    Push { data: Option<Vec<u8>> },
    NotificationClick { notification: Arc<dyn ActiveNotification> },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PushReport {
    pub payload: NotificationPayload,
    /// Number of pages the relay message was posted to.
    pub relayed: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    /// An open page was navigated to the deep link and focused.
    Focused { url: String },
    /// No page was open so a new window was opened.
    Opened { url: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AgentOutcome {
    Installed,
    Activated,
    Pushed(PushReport),
    Clicked(ClickOutcome),
}

pub struct DeliveryAgent {
    scope: Arc<dyn AgentScope>,
    config: AgentConfig,
    defaults: NotificationDefaults,
    phase: RwLock<AgentPhase>,
}

impl DeliveryAgent {
    pub fn new(scope: Arc<dyn AgentScope>, config: AgentConfig) -> Self {
        tracing::debug!("Service worker script loaded");
        let defaults = NotificationDefaults::from(&config);
        Self {
            scope,
            config,
            defaults,
            phase: RwLock::new(AgentPhase::Uninstalled),
        }
    }

    pub fn phase(&self) -> AgentPhase {
        self.phase
            .read()
            .map(|phase| *phase)
            .unwrap_or(AgentPhase::Uninstalled)
    }

    fn set_phase(&self, next: AgentPhase) {
        if let Ok(mut phase) = self.phase.write() {
            *phase = next;
        }
    }

    pub async fn dispatch(&self, event: AgentEvent) -> Result<AgentOutcome, Error> {
        match event {
            AgentEvent::Install => {
                self.install().await?;
                Ok(AgentOutcome::Installed)
            }
            AgentEvent::Activate => {
                self.activate().await?;
                Ok(AgentOutcome::Activated)
            }
            AgentEvent::Push { data } => {
                let report = self.handle_push(data.as_deref()).await?;
                Ok(AgentOutcome::Pushed(report))
            }
            AgentEvent::NotificationClick { notification } => {
                let outcome = self.handle_notification_click(notification.as_ref()).await?;
                Ok(AgentOutcome::Clicked(outcome))
            }
        }
    }

    /// Take over as soon as installed instead of waiting for pages using
    /// the previous version to close.
    pub async fn install(&self) -> Result<(), Error> {
        tracing::info!("Service worker installing");
        self.set_phase(AgentPhase::Installing);
        self.scope.skip_waiting().await
    }

    /// Claim pages that were opened before this version was installed.
    pub async fn activate(&self) -> Result<(), Error> {
        tracing::info!("Service worker activating");
        self.set_phase(AgentPhase::Activating);
        self.scope.claim_clients().await?;
        self.set_phase(AgentPhase::Active);
        Ok(())
    }

    /// Handle an incoming push: resolve the payload, relay it to every
    /// open page and show an OS notification. Returns once both have
    /// settled. Only a failure to display the notification is an error.
    pub async fn handle_push(&self, data: Option<&[u8]>) -> Result<PushReport, Error> {
        tracing::info!("Push event received");
        let payload = NotificationPayload::from_push_data(data, &self.defaults);

        // Pages get the original body, markup included
        let message = RelayMessage::NewNotification(payload.clone());
        let options = self.notification_options(&payload);

        let (relayed, shown) = futures::join!(
            self.relay(&message),
            self.scope.show_notification(&payload.title, &options)
        );
        shown?;

        Ok(PushReport { payload, relayed })
    }

    fn notification_options(&self, payload: &NotificationPayload) -> NotificationOptions {
        NotificationOptions {
            body: payload.plain_body(),
            icon: self.config.icon.clone(),
            badge: self.config.badge.clone(),
            data: NotificationData {
                url: payload.url.clone(),
            },
            require_interaction: self.config.require_interaction,
            vibrate: self.config.vibrate.clone(),
        }
    }

    // Fire and forget: a page failing to take the message is logged and
    // skipped.
    async fn relay(&self, message: &RelayMessage) -> usize {
        let query = ClientQuery {
            window_only: false,
            include_uncontrolled: true,
        };
        let clients = match self.scope.match_all(query).await {
            Ok(clients) => clients,
            Err(e) => {
                tracing::error!("Failed to list clients for relay: {}", e);
                return 0;
            }
        };

        let mut relayed = 0;
        for client in clients {
            match client.post_message(message) {
                Ok(()) => relayed += 1,
                Err(e) => tracing::warn!("Failed to relay notification to {}: {}", client.url(), e),
            }
        }
        relayed
    }

    /// Close the notification and take the user to its deep link, reusing
    /// an open page on this origin when there is one.
    pub async fn handle_notification_click(
        &self,
        notification: &dyn ActiveNotification,
    ) -> Result<ClickOutcome, Error> {
        tracing::info!("Notification clicked");
        notification.close();

        let url = notification
            .data()
            .as_ref()
            .and_then(|data| data.get("url"))
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .unwrap_or(self.config.default_url.as_str())
            .to_string();

        let query = ClientQuery {
            window_only: true,
            include_uncontrolled: true,
        };
        // Without a client list the deep link still opens in a new window
        let clients = match self.scope.match_all(query).await {
            Ok(clients) => clients,
            Err(e) => {
                tracing::warn!("Failed to list window clients: {}", e);
                Vec::new()
            }
        };
        let origin = self.scope.origin();

        if let Some(client) = clients
            .into_iter()
            .find(|client| is_same_origin(&client.url(), &origin))
        {
            if let Err(e) = client.navigate(&url).await {
                tracing::warn!("Failed to navigate client to {}: {}", url, e);
            }
            client.focus().await?;
            return Ok(ClickOutcome::Focused { url });
        }

        self.scope.open_window(&url).await?;
        Ok(ClickOutcome::Opened { url })
    }
}
