use anyhow::Result;
use hub_push::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
