//! RBAC console: JSON commands on stdin, JSON responses on stdout, logs on stderr.

use rbac_console::console;
use rbac_store::{InMemoryAuthzStore, StoreConfig};
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = StoreConfig::from_env();
    tracing::info!(seed = config.seed, policy = ?config.policy, "starting RBAC console");
    let store = InMemoryAuthzStore::from_config(&config);

    let handled = console::run(
        &store,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;
    tracing::info!(handled, "input closed");
    Ok(())
}
