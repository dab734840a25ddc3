use anyhow::Result;

use crate::core::AppConfig;
use crate::notify::PushSubscriptionCredential;
use crate::subscription::{HttpBackend, SubscriptionBackend};

pub async fn run(
    config: &AppConfig,
    user_id: i64,
    token: &str,
    endpoint: String,
    p256dh: String,
    auth: String,
) -> Result<()> {
    let credential = PushSubscriptionCredential {
        endpoint,
        p256dh,
        auth,
    };
    let backend = HttpBackend::new(&config.api_base_url);
    backend
        .publish_subscription(user_id, token, &credential)
        .await?;
    println!("Subscription saved for user {}", user_id);
    Ok(())
}
