use actix_web::{get, web, Responder};
use serde::Deserialize;

use crate::{
    aggregate::parse_period,
    cache_keys,
    configuration::{AppState, State},
    error::Error,
    handler::load_report,
    helpers::build_cache_key,
};

/// Scalar KPI rollup over the filtered contract set.
#[get("/kpis")]
async fn index(
    state: web::Data<AppState<State>>,
    query: web::Query<Query>,
) -> Result<impl Responder, Error> {
    let period = parse_period(&query.period)?;
    let cache_key = build_cache_key(cache_keys::REPORT, period.as_str());

    let report = match state.api_cache.report.get(&cache_key).await {
        Some(cached) => cached,
        None => load_report(state.get_ref(), period).await?,
    };

    Ok(web::Json(report.kpis))
}

#[derive(Debug, Deserialize)]
pub struct Query {
    /// Time period filter: 30d, 90d, 6m, 12m (default), ytd, all
    period: Option<String>,
}
