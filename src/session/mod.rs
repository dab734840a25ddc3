//! Ties the push subscription lifecycle to the login session.

use std::sync::Arc;

use anyhow::{Error, Result};
use async_trait::async_trait;
use tokio::task::JoinHandle;

/// An authenticated session as the application holds it locally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub user_id: i64,
    pub token: String,
}

/// Push operations the binder drives. Implemented by
/// `SubscriptionManager`.
#[async_trait]
pub trait PushLifecycle: Send + Sync {
    async fn setup(&self, user_id: i64, token: &str) -> bool;

    async fn teardown(&self) -> bool;

    /// Register the agent without subscribing.
    async fn register(&self) -> bool;
}

/// Checks with the backend that a stored session is still accepted.
#[async_trait]
pub trait SessionProbe: Send + Sync {
    async fn session_is_valid(&self, user_id: i64, token: &str) -> Result<bool, Error>;
}

/// Local session storage owned by the application.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Option<Session>;

    fn clear(&self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageLoadOutcome {
    /// No stored session, nothing to do.
    Anonymous,
    /// The backend rejected the stored session (or could not be asked).
    SessionInvalid,
    Subscribed,
    SubscriptionFailed,
}

pub struct SessionBinder {
    push: Arc<dyn PushLifecycle>,
    probe: Arc<dyn SessionProbe>,
    store: Arc<dyn SessionStore>,
}

impl SessionBinder {
    pub fn new(
        push: Arc<dyn PushLifecycle>,
        probe: Arc<dyn SessionProbe>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self { push, probe, store }
    }

    /// Start push setup for a fresh login without holding up the login
    /// itself. The handle resolves to whether setup succeeded.
    pub fn on_login(&self, session: &Session) -> JoinHandle<bool> {
        let push = Arc::clone(&self.push);
        let Session { user_id, token } = session.clone();
        tokio::spawn(async move {
            let ok = push.setup(user_id, &token).await;
            if !ok {
                tracing::warn!("Push notification setup failed for user {}", user_id);
            }
            ok
        })
    }

    /// Unsubscribe, then clear the local session.
    pub async fn on_logout(&self) -> bool {
        let unsubscribed = self.push.teardown().await;
        self.store.clear();
        unsubscribed
    }

    /// Restore push for a session that survived a page reload.
    pub async fn on_page_load(&self) -> PageLoadOutcome {
        let Some(session) = self.store.load() else {
            return PageLoadOutcome::Anonymous;
        };

        if !self.push.register().await {
            tracing::warn!("Service worker registration failed on page load");
        }

        match self
            .probe
            .session_is_valid(session.user_id, &session.token)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                tracing::info!("Stored session for user {} is no longer valid", session.user_id);
                return PageLoadOutcome::SessionInvalid;
            }
            Err(e) => {
                tracing::error!("Failed to verify session: {}", e);
                return PageLoadOutcome::SessionInvalid;
            }
        }

        if self.push.setup(session.user_id, &session.token).await {
            PageLoadOutcome::Subscribed
        } else {
            PageLoadOutcome::SubscriptionFailed
        }
    }
}
