use anyhow::{Result, anyhow};

use crate::core::AppConfig;
use crate::notify::{
    DeliveryStatus, NotificationDefaults, NotificationPayload, PushSubscriptionCredential,
    send_push_notification,
};

#[allow(clippy::too_many_arguments)]
pub async fn run(
    config: &AppConfig,
    endpoint: String,
    p256dh: String,
    auth: String,
    title: Option<String>,
    body: Option<String>,
    url: Option<String>,
) -> Result<()> {
    let vapid_key_path = config
        .vapid_key_path
        .as_deref()
        .ok_or_else(|| anyhow!("Missing env var HUB_VAPID_KEY_PATH"))?;

    let defaults = NotificationDefaults::from(&config.agent);
    let payload = NotificationPayload {
        title: title.unwrap_or(defaults.title),
        body: body.unwrap_or(defaults.body),
        url: url.unwrap_or(defaults.url),
    };
    let credential = PushSubscriptionCredential {
        endpoint,
        p256dh,
        auth,
    };

    match send_push_notification(vapid_key_path, &credential, &payload).await? {
        DeliveryStatus::Delivered => println!("Notification sent"),
        DeliveryStatus::Stale => println!("Subscription is no longer valid: {}", credential.endpoint),
    }
    Ok(())
}
