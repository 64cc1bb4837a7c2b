//! Terminal rendition of the dashboard: live price series next to the
//! curated post feed.
//!
//! ```bash
//! FEED_DATABASE_URL=https://<project>.firebaseio.com \
//! FEED_IMPORTANCE=3 CHART_MODE=1s \
//! cargo run --example dashboard
//! ```
//!
//! Variables may also live in a `.env` file.

use futures_util::StreamExt;
use market_pulse::prelude::*;
use tracing_subscriber::EnvFilter;

fn env_parse<T>(key: &str) -> Result<Option<T>, SdkError>
where
    T: std::str::FromStr<Err = SdkError>,
{
    std::env::var(key).ok().map(|v| v.parse()).transpose()
}

#[tokio::main]
async fn main() -> Result<(), SdkError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,market_pulse=debug")),
        )
        .init();

    let mut builder = MarketPulseClient::builder();
    if let Ok(url) = std::env::var("FEED_DATABASE_URL") {
        builder = builder.feed_database_url(&url);
    }
    if let Ok(token) = std::env::var("FEED_AUTH_TOKEN") {
        builder = builder.feed_auth_token(&token);
    }
    if let Ok(key) = std::env::var("PRICE_API_KEY") {
        builder = builder.api_key(&key);
    }
    let client = builder.build()?;

    let filter: ImportanceFilter = env_parse("FEED_IMPORTANCE")?.unwrap_or_default();
    let mode: Mode = env_parse("CHART_MODE")?.unwrap_or_default();

    // ── Price chart ──────────────────────────────────────────────────────
    let mut chart = client.prices().controller();
    let mut updates = chart.subscribe();
    chart.set_mode(mode).await;

    let chart_task = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            let Some(latest) = snapshot.latest() else {
                continue;
            };
            println!(
                "{} [{}] {} {}  ({} points, line {})",
                DATASET_LABEL,
                snapshot.mode.label(),
                latest.label,
                usd(latest.value),
                snapshot.points.len(),
                snapshot.color(),
            );
        }
    });

    // ── Post feed ────────────────────────────────────────────────────────
    let feed_task = if client.stream_config().database_url.is_empty() {
        tracing::warn!("FEED_DATABASE_URL not set; running without the post feed");
        None
    } else {
        let mut stream = client.feed().stream();
        stream.connect().await?;

        Some(tokio::spawn(async move {
            let mut state = FeedState::new();
            let mut events = stream.events();
            while let Some(event) = events.next().await {
                match event {
                    FeedEvent::Snapshot(value) => {
                        if !state.on_snapshot(Some(&value)) {
                            continue;
                        }
                        println!("── feed ({} posts, filter {}) ──", state.len(), filter);
                        for post in state.filter(filter).into_iter().take(5) {
                            println!(
                                "  [{}|{}] @{} {}: {}",
                                post.importance,
                                post.badge_color(),
                                post.username,
                                post.display_timestamp(&chrono::Local),
                                post.text
                            );
                            if let Some(insight) = &post.insight {
                                println!("      insight: {}", insight);
                            }
                        }
                    }
                    FeedEvent::MaxReconnectReached => {
                        tracing::error!("Feed stream gave up reconnecting");
                        break;
                    }
                    other => tracing::info!(event = ?other, "Feed stream event"),
                }
            }
        }))
    };

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| SdkError::Other(e.to_string()))?;

    chart.shutdown().await;
    chart_task.abort();
    if let Some(task) = feed_task {
        task.abort();
    }
    Ok(())
}
