pub mod analytics;
pub mod contract_trends;
pub mod kpis;
pub mod status_distribution;
pub mod top_commodities;
pub mod top_counterparties;
pub mod trader_performance;
pub mod version;
