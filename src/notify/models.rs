use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::AgentConfig;

/// What the backend needs to encrypt and address pushes to one
/// browser installation. Keys are standard base64.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PushSubscriptionCredential {
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
}

/// The logical message shown to the user and relayed to open pages.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub url: String,
}

/// Values used for any field a push payload leaves out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDefaults {
    pub title: String,
    pub body: String,
    pub url: String,
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        NotificationDefaults::from(&AgentConfig::default())
    }
}

impl From<&AgentConfig> for NotificationDefaults {
    fn from(config: &AgentConfig) -> Self {
        Self {
            title: config.default_title.clone(),
            body: config.default_body.clone(),
            url: config.default_url.clone(),
        }
    }
}

impl NotificationPayload {
    pub fn new(title: &str, body: &str, url: Option<&str>) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            url: url.unwrap_or("/").to_string(),
        }
    }

    pub fn from_defaults(defaults: &NotificationDefaults) -> Self {
        Self {
            title: defaults.title.clone(),
            body: defaults.body.clone(),
            url: defaults.url.clone(),
        }
    }

    /// Resolve the payload carried by a push event. Absent data, invalid
    /// JSON and missing or empty fields all fall back to `defaults`, so
    /// this never fails.
    pub fn from_push_data(data: Option<&[u8]>, defaults: &NotificationDefaults) -> Self {
        let Some(data) = data else {
            return Self::from_defaults(defaults);
        };

        match serde_json::from_slice::<Value>(data) {
            Ok(parsed) => {
                tracing::debug!("Push data: {}", parsed);
                Self::from_value(&parsed, defaults)
            }
            Err(e) => {
                tracing::error!("Error parsing push data: {}", e);
                Self::from_defaults(defaults)
            }
        }
    }

    /// Take `title`, `body` and `url` from a JSON object, using `defaults`
    /// for anything missing, empty or not a string.
    pub fn from_value(parsed: &Value, defaults: &NotificationDefaults) -> Self {
        let mut payload = Self::from_defaults(defaults);
        let field = |name: &str| {
            parsed
                .get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        if let Some(title) = field("title") {
            payload.title = title;
        }
        if let Some(body) = field("body") {
            payload.body = body;
        }
        if let Some(url) = field("url") {
            payload.url = url;
        }
        payload
    }

    /// Body with markup removed, for OS notifications that render plain text.
    pub fn plain_body(&self) -> String {
        strip_html_tags(&self.body)
    }
}

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Invalid HTML tag pattern"));

pub fn strip_html_tags(html: &str) -> String {
    HTML_TAG.replace_all(html, "").into_owned()
}

/// `type` tag of the envelope carrying a new notification.
pub const NEW_NOTIFICATION: &str = "NEW_NOTIFICATION";

/// Envelope posted from the agent to every open page. Serializes as
/// `{"type": "NEW_NOTIFICATION", "data": {...}}`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum RelayMessage {
    #[serde(rename = "NEW_NOTIFICATION")]
    NewNotification(NotificationPayload),
}

impl RelayMessage {
    pub fn payload(&self) -> &NotificationPayload {
        match self {
            RelayMessage::NewNotification(payload) => payload,
        }
    }
}

/// Metadata attached to a displayed notification so a click can find
/// its deep link again.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NotificationData {
    pub url: String,
}

/// Options for displaying an OS-level notification.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOptions {
    pub body: String,
    pub icon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    pub data: NotificationData,
    pub require_interaction: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vibrate: Vec<u32>,
}
