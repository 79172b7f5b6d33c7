// src/watch.rs
use std::time::Duration;

use anyhow::{bail, Context, Result};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;

use crate::dedup::MatchPolicy;
use crate::feed::types::IncidentSource;
use crate::publish::{compose_status, Publisher};
use crate::store::IncidentStore;

/// Cycle timing. Policy constants, not protocol requirements.
#[derive(Clone, Copy, Debug)]
pub struct WatchIntervals {
    pub poll: Duration,
    pub fetch_failure_backoff: Duration,
}

impl Default for WatchIntervals {
    fn default() -> Self {
        Self {
            poll: Duration::from_secs(5 * 60),
            fetch_failure_backoff: Duration::from_secs(15 * 60),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub novel: usize,
    pub duplicates: usize,
}

#[derive(Debug)]
pub enum CycleOutcome {
    Completed(CycleReport),
    /// The feed call failed; nothing was consumed, so the caller retries
    /// the whole cycle after the backoff interval.
    FetchFailed,
}

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("watch_cycles_total", "Completed polling cycles.");
        describe_counter!("watch_novel_total", "Records admitted as novel.");
        describe_counter!(
            "watch_duplicates_total",
            "Records dropped by the deduplication filter."
        );
        describe_counter!("watch_publishes_total", "Statuses published.");
        describe_counter!(
            "watch_policy_disagreements_total",
            "Records where field-match and pair-match disagree."
        );
        describe_counter!("feed_records_total", "Records parsed from the feed.");
        describe_counter!("feed_fetch_errors_total", "Feed fetch/parse errors.");
        describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!(
            "feed_latest_call_ts",
            "Unix ts of the newest call-received value seen in the feed."
        );
        describe_gauge!("watch_last_cycle_ts", "Unix ts when a cycle last completed.");
    });
}

/// Run one polling cycle: fetch, reload the ledger history, and for each
/// fetched record in feed order run the dedup filter; a novel record is
/// appended to the ledger and then published, exactly once each, in that
/// order.
///
/// A fetch failure is reported as [`CycleOutcome::FetchFailed`] and leaves
/// the ledger untouched. Ledger and publish errors propagate as `Err` —
/// the caller treats them as fatal.
pub async fn run_cycle(
    source: &dyn IncidentSource,
    store: &dyn IncidentStore,
    publisher: &dyn Publisher,
    policy: MatchPolicy,
) -> Result<CycleOutcome> {
    ensure_metrics_described();

    let records = match source.fetch_latest().await {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(error = ?e, source = source.name(), "fetch failed");
            return Ok(CycleOutcome::FetchFailed);
        }
    };

    let history = store.read_history().await.context("ledger history read")?;

    let mut report = CycleReport {
        fetched: records.len(),
        ..Default::default()
    };

    for record in &records {
        if !history.is_novel_under(policy, record) {
            report.duplicates += 1;
            continue;
        }
        store.append(record).await.context("ledger append")?;
        publisher
            .publish(&compose_status(record))
            .await
            .with_context(|| format!("publish via {}", publisher.name()))?;
        counter!("watch_publishes_total").increment(1);
        report.novel += 1;
    }

    counter!("watch_cycles_total").increment(1);
    counter!("watch_novel_total").increment(report.novel as u64);
    counter!("watch_duplicates_total").increment(report.duplicates as u64);
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    gauge!("watch_last_cycle_ts").set(now as f64);

    Ok(CycleOutcome::Completed(report))
}

/// The endless loop: cycle, sleep, repeat. Runs until a ledger or publish
/// error propagates; the surrounding runtime owns restart from there.
pub async fn run(
    source: &dyn IncidentSource,
    store: &dyn IncidentStore,
    publisher: &dyn Publisher,
    policy: MatchPolicy,
    intervals: WatchIntervals,
) -> Result<()> {
    loop {
        match run_cycle(source, store, publisher, policy).await? {
            CycleOutcome::Completed(report) => {
                tracing::info!(
                    fetched = report.fetched,
                    novel = report.novel,
                    duplicates = report.duplicates,
                    "cycle complete, sleeping {}s",
                    intervals.poll.as_secs()
                );
                tokio::time::sleep(intervals.poll).await;
            }
            CycleOutcome::FetchFailed => {
                tracing::warn!(
                    "fetch failed, backing off {}s",
                    intervals.fetch_failure_backoff.as_secs()
                );
                tokio::time::sleep(intervals.fetch_failure_backoff).await;
            }
        }
    }
}

/// Backfill an empty ledger with the current feed contents, without
/// publishing anything. Refuses to touch a ledger that already has rows.
pub async fn seed(source: &dyn IncidentSource, store: &dyn IncidentStore) -> Result<usize> {
    let history = store.read_history().await.context("ledger history read")?;
    if !history.is_empty() {
        bail!("ledger already holds {} rows, refusing to seed", history.len());
    }

    let records = source.fetch_latest().await.context("seed fetch")?;
    for record in &records {
        store.append(record).await.context("ledger append")?;
    }
    tracing::info!(rows = records.len(), "ledger seeded");
    Ok(records.len())
}
