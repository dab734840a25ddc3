use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ListenerHandle, RelayChannel};
use crate::notify::NotificationPayload;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxEntry {
    /// Local id, only unique within this inbox.
    pub id: u64,
    pub title: String,
    pub content: String,
    pub link: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

pub const DEFAULT_INBOX_LIMIT: usize = 100;

/// In-page notification list fed by relayed pushes. Newest first; the
/// oldest entries are dropped once `limit` is reached.
#[derive(Debug)]
pub struct NotificationInbox {
    entries: VecDeque<InboxEntry>,
    next_id: u64,
    limit: usize,
}

impl Default for NotificationInbox {
    fn default() -> Self {
        Self::with_limit(DEFAULT_INBOX_LIMIT)
    }
}

impl NotificationInbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            next_id: 0,
            limit: limit.max(1),
        }
    }

    pub fn record(&mut self, payload: NotificationPayload) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push_front(InboxEntry {
            id,
            title: payload.title,
            content: payload.body,
            link: payload.url,
            created_at: Utc::now(),
            is_read: false,
        });
        self.entries.truncate(self.limit);
        id
    }

    pub fn entries(&self) -> &VecDeque<InboxEntry> {
        &self.entries
    }

    pub fn unread_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_read).count()
    }

    pub fn mark_read(&mut self, id: u64) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.is_read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for entry in &mut self.entries {
            entry.is_read = true;
        }
    }

    /// Record every new-notification message arriving on `channel`.
    pub fn attach(inbox: &Arc<Mutex<Self>>, channel: &Arc<RelayChannel>) -> ListenerHandle {
        let inbox = Arc::clone(inbox);
        channel.on_push_message(move |payload| match inbox.lock() {
            Ok(mut inbox) => {
                inbox.record(payload);
            }
            Err(e) => tracing::error!("Notification inbox lock poisoned: {}", e),
        })
    }
}
