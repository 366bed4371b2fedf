//! Sleep SDK command-line driver
//!
//! Fetches one record (`sleep_sdk <id>`) or the default record page
//! (`sleep_sdk`) through the governed client and prints the result followed
//! by cache and limiter statistics.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sleep_sdk::models::{FetchManyOptions, FetchOptions};
use sleep_sdk::{Config, SleepClient};

/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the client (HTTP transport, cache, limiter) and preload if configured
/// 4. Run the requested fetch twice to show the cache at work
/// 5. Print statistics
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sleep_sdk=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("failed to load configuration")?;
    info!(
        "Configuration loaded: environment={:?}, max_requests_per_minute={}, burst_limit={}, default_ttl={}s",
        config.environment,
        config.max_requests_per_minute,
        config.burst_limit,
        config.cache.default_ttl
    );

    let client = SleepClient::init(config)
        .await
        .context("failed to initialize client")?;
    let cleanup_handle = client.spawn_cleanup();

    let id = std::env::args().nth(1);
    for _ in 0..2 {
        let result = match &id {
            Some(id) => client.fetch_one(id, &FetchOptions::default()).await,
            None => client.fetch_many(&FetchManyOptions::default()).await,
        }
        .context("governed fetch failed")?;

        info!(from_cache = result.from_cache, "fetch complete");
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    println!("{}", serde_json::to_string_pretty(&client.stats().await)?);

    cleanup_handle.abort();
    Ok(())
}
