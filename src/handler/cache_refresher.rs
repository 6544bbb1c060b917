//! Background cache refresh task
//!
//! Keeps the per-period report caches warm: populates every period key
//! on startup, then refreshes keys that are about to expire, with
//! bounded concurrency so the CRM API is not hammered.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::{
    aggregate::Period,
    cache_keys,
    configuration::{AppState, State},
    error::Error,
    handler::report::load_report,
    helpers::build_cache_key,
};

/// How often to check for caches needing refresh (in seconds)
const REFRESH_CHECK_INTERVAL_SECS: u64 = 30;

/// Maximum number of concurrent refreshes, each one a full
/// fetch-and-aggregate against the CRM API
const MAX_CONCURRENT_REFRESHES: usize = 2;

/// Maximum number of concurrent refreshes during initial population
const MAX_CONCURRENT_INITIAL_REFRESHES: usize = 3;

/// Main background task for cache refresh
/// Runs indefinitely, checking and refreshing caches that are about to expire
pub async fn cache_refresh_task(
    app_state: AppState<State>,
) -> Result<(), Error> {
    info!("Starting cache refresh background task");

    info!("Performing initial cache population...");
    refresh_periods(
        &app_state,
        Period::ALL.to_vec(),
        MAX_CONCURRENT_INITIAL_REFRESHES,
    )
    .await;
    info!("Initial cache population complete");

    let mut check_interval =
        interval(Duration::from_secs(REFRESH_CHECK_INTERVAL_SECS));

    loop {
        check_interval.tick().await;

        let mut due = Vec::new();
        for period in Period::ALL {
            let key = build_cache_key(cache_keys::REPORT, period.as_str());
            if app_state.api_cache.report.needs_refresh(&key).await {
                due.push(period);
            }
        }

        if due.is_empty() {
            debug!("No caches need refresh");
            continue;
        }

        debug!(
            "Refreshing {} report caches (max {}): {:?}",
            due.len(),
            MAX_CONCURRENT_REFRESHES,
            due
        );
        refresh_periods(&app_state, due, MAX_CONCURRENT_REFRESHES).await;
    }
}

/// Refresh the given period keys in parallel with a concurrency limit
async fn refresh_periods(
    app_state: &AppState<State>,
    periods: Vec<Period>,
    max_concurrent: usize,
) {
    let results: Vec<_> = stream::iter(periods)
        .map(|period| {
            let app_state = app_state.clone();
            async move {
                let result = refresh_single_period(&app_state, period).await;
                (period, result)
            }
        })
        .buffer_unordered(max_concurrent)
        .collect()
        .await;

    for (period, result) in results {
        match result {
            Ok(true) => {
                debug!("Successfully refreshed report cache: {}", period)
            },
            Ok(false) => debug!(
                "Report cache {} already being refreshed, skipped",
                period
            ),
            Err(e) => {
                warn!("Failed to refresh report cache {}: {}", period, e)
            },
        }
    }
}

/// Refresh a single period key with stampede protection.
/// Returns Ok(true) if refresh was performed, Ok(false) if already refreshing.
async fn refresh_single_period(
    app_state: &AppState<State>,
    period: Period,
) -> Result<bool, Error> {
    let key = build_cache_key(cache_keys::REPORT, period.as_str());

    if !app_state.api_cache.report.try_start_refresh(&key).await {
        return Ok(false);
    }

    let result = load_report(app_state, period).await;
    app_state.api_cache.report.finish_refresh(&key).await;

    result.map(|_| true)
}
