//! dispatch-watch — Binary Entrypoint
//! Polls the incident feed, records novel incidents to the ledger, and
//! publishes one status per novel record. `dispatch-watch seed` backfills
//! an empty ledger once and exits.

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dispatch_watch::feed::OpenDataFeed;
use dispatch_watch::publish::{LogPublisher, Publisher, TwitterPublisher};
use dispatch_watch::store::{IncidentStore, MemoryStore, SheetsStore};
use dispatch_watch::{watch, Config};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("dispatch_watch=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op where the environment is already set.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Config::from_env()?;
    dispatch_watch::metrics::init(config.metrics_port)?;

    let source = OpenDataFeed::from_url(config.feed_url.clone(), config.feed_app_token.clone());

    let store: Box<dyn IncidentStore> = if config.dry_run {
        Box::new(MemoryStore::new())
    } else {
        Box::new(SheetsStore::new(
            config.sheet_key.clone(),
            config.sheets_access_token.clone(),
        ))
    };

    let publisher: Box<dyn Publisher> = if config.dry_run {
        Box::new(LogPublisher)
    } else {
        Box::new(TwitterPublisher::new(config.twitter_access_token.clone()))
    };

    if std::env::args().nth(1).as_deref() == Some("seed") {
        let rows = watch::seed(&source, store.as_ref()).await?;
        tracing::info!(rows, "seed complete");
        return Ok(());
    }

    tracing::info!(
        policy = ?config.match_policy,
        poll_secs = config.intervals.poll.as_secs(),
        dry_run = config.dry_run,
        "starting watch loop"
    );
    watch::run(
        &source,
        store.as_ref(),
        publisher.as_ref(),
        config.match_policy,
        config.intervals,
    )
    .await
}
