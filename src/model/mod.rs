pub use self::{
    contract::{Contract, ContractStatus, ContractsPage},
    report::{
        AnalyticsReport, CommodityRank, CounterpartyRank, Kpis, StatusBucket,
        TraderRank, TrendPoint,
    },
};

mod contract;
mod report;
