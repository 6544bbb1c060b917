use actix_web::{get, web, HttpResponse};
use serde::Deserialize;

use crate::{
    aggregate::parse_period,
    cache_keys,
    configuration::{AppState, State},
    error::Error,
    handler::load_report,
    helpers::{build_cache_key, to_csv_response},
};

/// Top 10 traders by contract value with per-trader completion rate.
#[get("/trader-performance")]
async fn index(
    state: web::Data<AppState<State>>,
    query: web::Query<Query>,
) -> Result<HttpResponse, Error> {
    let period = parse_period(&query.period)?;
    let cache_key = build_cache_key(cache_keys::REPORT, period.as_str());

    let report = match state.api_cache.report.get(&cache_key).await {
        Some(cached) => cached,
        None => load_report(state.get_ref(), period).await?,
    };

    match query.format.as_deref() {
        Some("csv") => to_csv_response(
            &report.trader_performance,
            "trader-performance.csv",
        ),
        _ => Ok(HttpResponse::Ok().json(report.trader_performance)),
    }
}

#[derive(Debug, Deserialize)]
pub struct Query {
    /// Response format
    format: Option<String>,
    /// Time period filter: 30d, 90d, 6m, 12m (default), ytd, all
    period: Option<String>,
}
