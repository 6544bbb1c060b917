use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    aggregate::{aggregate, filter_contracts, Period},
    cache_keys,
    configuration::{AppState, State},
    error::Error,
    helpers::build_cache_key,
    model::AnalyticsReport,
};

/// Orders concurrent fetch-then-aggregate sequences per cache key.
///
/// The aggregation itself is pure and has no notion of time, so the
/// caller has to make sure a newer invocation wins: a sequence number is
/// taken before the fetch starts and a result is only applied when no
/// fresher one got there first.
#[derive(Debug, Default)]
pub struct ReportSequencer {
    next: AtomicU64,
    applied: RwLock<HashMap<String, u64>>,
}

impl ReportSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next sequence number, before the fetch begins.
    pub fn begin(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Record `seq` as applied for `key` unless a newer sequence already
    /// was. Returns false when the result is stale and must be dropped.
    pub async fn try_apply(&self, key: &str, seq: u64) -> bool {
        let mut applied = self.applied.write().await;
        let latest = applied.entry(key.to_string()).or_insert(0);
        if seq > *latest {
            *latest = seq;
            return true;
        }
        false
    }
}

/// Fetch the contract set, filter it to the period's window, aggregate,
/// and cache the report under the period key. A stale run still returns
/// its report to its own caller but never overwrites the cache.
pub async fn load_report(
    state: &AppState<State>,
    period: Period,
) -> Result<AnalyticsReport, Error> {
    let key = build_cache_key(cache_keys::REPORT, period.as_str());
    let seq = state.reports.begin();

    let contracts = state.http.get_contracts().await?;
    let filtered = filter_contracts(contracts, period, Utc::now());
    let report = aggregate(&filtered)?;

    if state.reports.try_apply(&key, seq).await {
        state.api_cache.report.set(&key, report.clone()).await;
    } else {
        debug!("stale report for {} dropped", key);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sequence_numbers_increase() {
        let sequencer = ReportSequencer::new();
        let first = sequencer.begin();
        let second = sequencer.begin();
        assert!(second > first);
    }

    #[tokio::test]
    async fn newer_result_wins_over_stale_one() {
        let sequencer = ReportSequencer::new();
        let old = sequencer.begin();
        let new = sequencer.begin();

        // The newer sequence completes first; the stale one must lose
        assert!(sequencer.try_apply("report_12m", new).await);
        assert!(!sequencer.try_apply("report_12m", old).await);
    }

    #[tokio::test]
    async fn in_order_results_both_apply() {
        let sequencer = ReportSequencer::new();
        let first = sequencer.begin();
        let second = sequencer.begin();

        assert!(sequencer.try_apply("report_all", first).await);
        assert!(sequencer.try_apply("report_all", second).await);
    }

    #[tokio::test]
    async fn keys_are_sequenced_independently() {
        let sequencer = ReportSequencer::new();
        let old = sequencer.begin();
        let new = sequencer.begin();

        assert!(sequencer.try_apply("report_30d", new).await);
        assert!(sequencer.try_apply("report_90d", old).await);
    }
}
