pub mod codec;
pub mod models;
pub use models::*;

use std::io::Cursor;
use std::sync::Arc;

use anyhow::{Error, Result};
use web_push::{
    ContentEncoding, HyperWebPushClient, SubscriptionInfo, VapidSignatureBuilder, WebPushClient,
    WebPushError, WebPushMessageBuilder,
};

/// Outcome of handing one message to the push service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered,
    /// The push service no longer knows the endpoint (404/410); the
    /// credential should be dropped by whoever stores it.
    Stale,
}

fn subscription_info(credential: &PushSubscriptionCredential) -> SubscriptionInfo {
    SubscriptionInfo::new(
        credential.endpoint.clone(),
        codec::to_url_safe(&credential.p256dh),
        codec::to_url_safe(&credential.auth),
    )
}

async fn deliver(
    client: &HyperWebPushClient,
    vapid_pem: &[u8],
    credential: &PushSubscriptionCredential,
    payload: &NotificationPayload,
) -> Result<DeliveryStatus, Error> {
    let subscription_info = subscription_info(credential);
    let sig_builder =
        VapidSignatureBuilder::from_pem(Cursor::new(vapid_pem), &subscription_info)?.build()?;

    let mut builder = WebPushMessageBuilder::new(&subscription_info);
    let content = serde_json::to_string(payload)?;
    builder.set_payload(ContentEncoding::Aes128Gcm, content.as_bytes());
    builder.set_vapid_signature(sig_builder);
    let message = builder.build()?;

    match client.send(message).await {
        Ok(()) => Ok(DeliveryStatus::Delivered),
        Err(WebPushError::EndpointNotValid { .. }) | Err(WebPushError::EndpointNotFound { .. }) => {
            tracing::info!("Push endpoint is gone: {}", credential.endpoint);
            Ok(DeliveryStatus::Stale)
        }
        Err(e) => Err(e.into()),
    }
}

/// Encrypt `payload` for one subscription and post it to its push service.
pub async fn send_push_notification(
    vapid_private_pem_path: &str,
    credential: &PushSubscriptionCredential,
    payload: &NotificationPayload,
) -> Result<DeliveryStatus, Error> {
    let vapid_pem = tokio::fs::read(vapid_private_pem_path).await?;
    let client = HyperWebPushClient::new();
    deliver(&client, &vapid_pem, credential, payload).await
}

/// Send `payload` to every subscription concurrently. Failures are logged
/// and skipped; the endpoints reported stale are returned.
pub async fn broadcast_push_notification(
    credentials: Vec<PushSubscriptionCredential>,
    vapid_private_pem_path: &str,
    payload: NotificationPayload,
) -> Result<Vec<String>, Error> {
    let vapid_pem: Arc<[u8]> = tokio::fs::read(vapid_private_pem_path).await?.into();
    let client = Arc::new(HyperWebPushClient::new());
    let payload = Arc::new(payload);

    let mut tasks = tokio::task::JoinSet::new();
    for credential in credentials {
        let vapid_pem = Arc::clone(&vapid_pem);
        let client = Arc::clone(&client);
        let payload = Arc::clone(&payload);
        tasks.spawn(async move {
            let status = deliver(&client, &vapid_pem, &credential, &payload).await;
            (credential.endpoint, status)
        });
    }

    let mut stale = Vec::new();
    while let Some(res) = tasks.join_next().await {
        match res {
            Ok((endpoint, Ok(DeliveryStatus::Stale))) => stale.push(endpoint),
            Ok((_, Ok(DeliveryStatus::Delivered))) => {}
            Ok((endpoint, Err(e))) => tracing::error!("Push to {} failed: {}", endpoint, e),
            Err(e) => tracing::error!("Push task failed: {}", e),
        }
    }
    Ok(stale)
}
