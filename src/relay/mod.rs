//! Foreground side of the agent's relay: a page's message channel and the
//! listeners that react to new notifications.

pub mod inbox;
pub use inbox::*;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use serde_json::Value;

use crate::notify::{NEW_NOTIFICATION, NotificationDefaults, NotificationPayload};

type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

/// A page's channel to the agent. Every listener sees every message.
#[derive(Default)]
pub struct RelayChannel {
    listeners: RwLock<Vec<(u64, Listener)>>,
    next_id: AtomicU64,
}

impl RelayChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_listener<F>(&self, listener: F) -> u64
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut listeners) = self.listeners.write() {
            listeners.push((id, Arc::new(listener)));
        }
        id
    }

    pub fn remove_listener(&self, id: u64) -> bool {
        let Ok(mut listeners) = self.listeners.write() else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().map(|l| l.len()).unwrap_or(0)
    }

    /// Deliver a raw message from the agent to all current listeners and
    /// return how many were called.
    pub fn dispatch(&self, message: &Value) -> usize {
        // Snapshot so listeners may add or remove listeners while running
        let snapshot: Vec<Listener> = match self.listeners.read() {
            Ok(listeners) => listeners.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(_) => return 0,
        };
        for listener in &snapshot {
            listener(message);
        }
        snapshot.len()
    }

    /// Call `callback` with the payload of every new-notification message;
    /// anything else on the channel is ignored. Fields the message leaves
    /// out are filled from the default notification copy.
    pub fn on_push_message<F>(self: &Arc<Self>, callback: F) -> ListenerHandle
    where
        F: Fn(NotificationPayload) + Send + Sync + 'static,
    {
        let defaults = NotificationDefaults::default();
        let id = self.add_listener(move |message| {
            if message.get("type").and_then(Value::as_str) != Some(NEW_NOTIFICATION) {
                return;
            }
            let payload = match message.get("data") {
                Some(data) if data.is_object() => NotificationPayload::from_value(data, &defaults),
                other => {
                    tracing::debug!("Push message without notification data: {:?}", other);
                    NotificationPayload::from_defaults(&defaults)
                }
            };
            tracing::debug!("Received push notification: {:?}", payload);
            callback(payload);
        });
        ListenerHandle {
            channel: Arc::downgrade(self),
            id,
        }
    }
}

/// Returned by `on_push_message`; removes the listener when told to.
#[derive(Debug)]
pub struct ListenerHandle {
    channel: Weak<RelayChannel>,
    id: u64,
}

impl ListenerHandle {
    pub fn unsubscribe(self) -> bool {
        match self.channel.upgrade() {
            Some(channel) => channel.remove_listener(self.id),
            None => false,
        }
    }
}

impl std::fmt::Debug for RelayChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayChannel")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
