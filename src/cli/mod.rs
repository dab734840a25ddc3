use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod decode_key;
pub mod publish;
pub mod send;

use crate::core::AppConfig;

#[derive(Subcommand)]
enum Command {
    /// Decode the VAPID public key into the bytes passed to subscribe
    DecodeKey {
        /// Key to decode instead of the configured one
        #[arg(long)]
        key: Option<String>,
    },
    /// Send a subscription credential to the backend
    Publish {
        #[arg(long)]
        user_id: i64,
        #[arg(long)]
        token: String,
        #[arg(long)]
        endpoint: String,
        #[arg(long)]
        p256dh: String,
        #[arg(long)]
        auth: String,
    },
    /// Deliver one push notification to a subscription
    Send {
        #[arg(long)]
        endpoint: String,
        #[arg(long)]
        p256dh: String,
        #[arg(long)]
        auth: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        url: Option<String>,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=debug", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::default();

    match args.command {
        Some(Command::DecodeKey { key }) => {
            decode_key::run(key.as_deref().unwrap_or(config.vapid_public_key.as_str()))?;
        }
        Some(Command::Publish {
            user_id,
            token,
            endpoint,
            p256dh,
            auth,
        }) => {
            publish::run(&config, user_id, &token, endpoint, p256dh, auth).await?;
        }
        Some(Command::Send {
            endpoint,
            p256dh,
            auth,
            title,
            body,
            url,
        }) => {
            send::run(&config, endpoint, p256dh, auth, title, body, url).await?;
        }
        None => {}
    }

    Ok(())
}
