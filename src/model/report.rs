use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::model::ContractStatus;

/// One month bucket of the contract trend series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Month label, e.g. "Jan 25"
    pub month: String,
    pub contracts: i64,
    pub value: BigDecimal,
    pub avg_value: BigDecimal,
}

/// One status bucket, reported in status declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusBucket {
    pub status: ContractStatus,
    pub count: i64,
    pub value: BigDecimal,
}

/// Counterparty ranking entry, ordered by descending value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterpartyRank {
    pub name: String,
    pub contracts: i64,
    pub value: BigDecimal,
    /// Share of the filtered contract count, percent with 2 decimals
    pub percentage: f64,
}

/// Commodity ranking entry, ordered by descending traded volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommodityRank {
    pub name: String,
    pub contracts: i64,
    pub volume: BigDecimal,
    pub value: BigDecimal,
}

/// Trader performance entry, ordered by descending value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraderRank {
    pub name: String,
    pub contracts: i64,
    pub value: BigDecimal,
    pub completed: i64,
    /// Per-trader completion rate, percent with 2 decimals
    pub completion: f64,
}

/// Scalar rollup over the filtered contract set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kpis {
    pub total_contracts: i64,
    pub total_value: BigDecimal,
    pub avg_contract_value: BigDecimal,
    /// Percent of completed contracts, 2 decimals, 0 for an empty set
    pub completion_rate: f64,
    pub active_traders: i64,
}

/// Full derived report over one filtered contract set.
///
/// Plain data: the rendering layer decides how each view is charted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub contract_trends: Vec<TrendPoint>,
    pub status_distribution: Vec<StatusBucket>,
    pub top_counterparties: Vec<CounterpartyRank>,
    pub top_commodities: Vec<CommodityRank>,
    pub trader_performance: Vec<TraderRank>,
    pub kpis: Kpis,
}
