use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use bigdecimal::{BigDecimal, Zero};
use chrono::Datelike;

use crate::{
    error::Error,
    helpers::round2,
    model::{
        AnalyticsReport, CommodityRank, Contract, ContractStatus,
        CounterpartyRank, Kpis, StatusBucket, TraderRank, TrendPoint,
    },
};

/// Category used when a display name is missing or empty.
const UNKNOWN: &str = "Unknown";

/// Ranking lists are truncated to this many entries.
const TOP_N: usize = 10;

#[derive(Debug, Default)]
struct Bucket {
    contracts: i64,
    value: BigDecimal,
    volume: BigDecimal,
    completed: i64,
}

/// Accumulators keyed by display name, preserving first-encountered
/// order so ranking ties resolve deterministically.
#[derive(Debug, Default)]
struct NamedBuckets {
    index: HashMap<String, usize>,
    entries: Vec<(String, Bucket)>,
}

impl NamedBuckets {
    fn entry(&mut self, name: &str) -> &mut Bucket {
        let idx = match self.index.get(name) {
            Some(&idx) => idx,
            None => {
                let idx = self.entries.len();
                self.index.insert(name.to_owned(), idx);
                self.entries.push((name.to_owned(), Bucket::default()));
                idx
            },
        };
        &mut self.entries[idx].1
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries sorted descending by the given key, truncated to top-N.
    /// The sort is stable, so equal keys keep insertion order.
    fn ranked<K>(mut self, key: K) -> Vec<(String, Bucket)>
    where
        K: Fn(&Bucket) -> &BigDecimal,
    {
        self.entries
            .sort_by(|(_, a), (_, b)| key(b).cmp(key(a)));
        self.entries.truncate(TOP_N);
        self.entries
    }
}

fn display_name(name: &Option<String>) -> &str {
    name.as_deref().filter(|n| !n.is_empty()).unwrap_or(UNKNOWN)
}

fn parse_amount(
    contract: &Contract,
    field: &'static str,
    raw: &str,
) -> Result<BigDecimal, Error> {
    BigDecimal::from_str(raw).map_err(|_| Error::InvalidData {
        id: contract.id,
        field,
        value: raw.to_owned(),
    })
}

/// Label for a month bucket, e.g. "Jan 25". chrono renders English
/// month abbreviations regardless of locale.
fn month_label(year: i32, month: u32) -> String {
    match chrono::NaiveDate::from_ymd_opt(year, month, 1) {
        Some(date) => date.format("%b %y").to_string(),
        None => format!("{:02} {}", month, year),
    }
}

fn ratio_percent(part: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(part as f64 / total as f64 * 100.0)
}

/// Single pass over the (already filtered) contract set producing every
/// derived view at once.
///
/// Pure and stateless: all accumulators live on the stack of this call,
/// so repeated invocations over the same input yield identical reports.
/// A malformed `price`/`quantity` aborts the whole run; no partial
/// report is ever produced.
pub fn aggregate(contracts: &[Contract]) -> Result<AnalyticsReport, Error> {
    let mut months: BTreeMap<(i32, u32), Bucket> = BTreeMap::new();
    let mut statuses: HashMap<ContractStatus, Bucket> = HashMap::new();
    let mut counterparties = NamedBuckets::default();
    let mut commodities = NamedBuckets::default();
    let mut traders = NamedBuckets::default();

    let mut total_value = BigDecimal::zero();
    let mut completed_total: i64 = 0;

    for contract in contracts {
        let price = parse_amount(contract, "price", &contract.price)?;
        let quantity =
            parse_amount(contract, "quantity", &contract.quantity)?;
        if quantity < BigDecimal::zero() {
            return Err(Error::InvalidData {
                id: contract.id,
                field: "quantity",
                value: contract.quantity.to_owned(),
            });
        }

        // Computed once and reused by every bucket this contract touches
        let line_value = &price * &quantity;
        let completed = contract.status == ContractStatus::Completed;

        let month = months
            .entry((contract.date.year(), contract.date.month()))
            .or_default();
        month.contracts += 1;
        month.value += &line_value;

        let status = statuses.entry(contract.status).or_default();
        status.contracts += 1;
        status.value += &line_value;

        let counterparty =
            counterparties.entry(display_name(&contract.counterparty_name));
        counterparty.contracts += 1;
        counterparty.value += &line_value;

        let commodity =
            commodities.entry(display_name(&contract.commodity_name));
        commodity.contracts += 1;
        commodity.volume += &quantity;
        commodity.value += &line_value;

        let trader = traders.entry(display_name(&contract.trader_name));
        trader.contracts += 1;
        trader.value += &line_value;
        if completed {
            trader.completed += 1;
            completed_total += 1;
        }

        total_value += line_value;
    }

    let total_contracts = contracts.len() as i64;

    let contract_trends = months
        .into_iter()
        .map(|((year, month), bucket)| TrendPoint {
            month: month_label(year, month),
            contracts: bucket.contracts,
            avg_value: if bucket.contracts > 0 {
                &bucket.value / BigDecimal::from(bucket.contracts)
            } else {
                BigDecimal::zero()
            },
            value: bucket.value,
        })
        .collect();

    // Declaration order of the status enum, empty buckets dropped
    let status_distribution = ContractStatus::ALL
        .into_iter()
        .filter_map(|status| {
            statuses.remove(&status).map(|bucket| StatusBucket {
                status,
                count: bucket.contracts,
                value: bucket.value,
            })
        })
        .collect();

    let top_counterparties = counterparties
        .ranked(|bucket| &bucket.value)
        .into_iter()
        .map(|(name, bucket)| CounterpartyRank {
            name,
            contracts: bucket.contracts,
            value: bucket.value,
            percentage: ratio_percent(bucket.contracts, total_contracts),
        })
        .collect();

    let top_commodities = commodities
        .ranked(|bucket| &bucket.volume)
        .into_iter()
        .map(|(name, bucket)| CommodityRank {
            name,
            contracts: bucket.contracts,
            volume: bucket.volume,
            value: bucket.value,
        })
        .collect();

    let active_traders = traders.len() as i64;
    let trader_performance = traders
        .ranked(|bucket| &bucket.value)
        .into_iter()
        .map(|(name, bucket)| TraderRank {
            name,
            contracts: bucket.contracts,
            value: bucket.value,
            completed: bucket.completed,
            completion: ratio_percent(bucket.completed, bucket.contracts),
        })
        .collect();

    let kpis = Kpis {
        total_contracts,
        avg_contract_value: if total_contracts > 0 {
            &total_value / BigDecimal::from(total_contracts)
        } else {
            BigDecimal::zero()
        },
        completion_rate: ratio_percent(completed_total, total_contracts),
        active_traders,
        total_value,
    };

    Ok(AnalyticsReport {
        contract_trends,
        status_distribution,
        top_counterparties,
        top_commodities,
        trader_performance,
        kpis,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn contract(
        id: i64,
        date: (i32, u32, u32),
        price: &str,
        quantity: &str,
        status: ContractStatus,
        counterparty: Option<&str>,
    ) -> Contract {
        Contract {
            id,
            contract_number: format!("CT-{}", id),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            price: price.to_string(),
            quantity: quantity.to_string(),
            status,
            counterparty_name: counterparty.map(str::to_string),
            commodity_name: None,
            trader_name: None,
        }
    }

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    fn scenario() -> Vec<Contract> {
        vec![
            contract(
                1,
                (2025, 1, 10),
                "100",
                "2",
                ContractStatus::Completed,
                Some("Acme"),
            ),
            contract(
                2,
                (2025, 1, 20),
                "50",
                "4",
                ContractStatus::Draft,
                Some("Acme"),
            ),
            contract(
                3,
                (2025, 2, 5),
                "10",
                "1",
                ContractStatus::Completed,
                Some("Beta"),
            ),
        ]
    }

    #[test]
    fn dashboard_scenario() {
        let report = aggregate(&scenario()).unwrap();

        let trends = &report.contract_trends;
        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0].month, "Jan 25");
        assert_eq!(trends[0].contracts, 2);
        assert_eq!(trends[0].value, dec("400"));
        assert_eq!(trends[0].avg_value, dec("200"));
        assert_eq!(trends[1].month, "Feb 25");
        assert_eq!(trends[1].contracts, 1);
        assert_eq!(trends[1].value, dec("10"));
        assert_eq!(trends[1].avg_value, dec("10"));

        let statuses = &report.status_distribution;
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].status, ContractStatus::Draft);
        assert_eq!(statuses[0].count, 1);
        assert_eq!(statuses[0].value, dec("200"));
        assert_eq!(statuses[1].status, ContractStatus::Completed);
        assert_eq!(statuses[1].count, 2);
        assert_eq!(statuses[1].value, dec("210"));

        let counterparties = &report.top_counterparties;
        assert_eq!(counterparties.len(), 2);
        assert_eq!(counterparties[0].name, "Acme");
        assert_eq!(counterparties[0].contracts, 2);
        assert_eq!(counterparties[0].value, dec("400"));
        assert_eq!(counterparties[0].percentage, 66.67);
        assert_eq!(counterparties[1].name, "Beta");
        assert_eq!(counterparties[1].contracts, 1);
        assert_eq!(counterparties[1].value, dec("10"));

        assert_eq!(report.kpis.total_contracts, 3);
        assert_eq!(report.kpis.total_value, dec("410"));
        assert_eq!(report.kpis.completion_rate, 66.67);
    }

    #[test]
    fn every_contract_lands_in_one_month_and_one_status_bucket() {
        let contracts = scenario();
        let report = aggregate(&contracts).unwrap();

        let by_month: i64 =
            report.contract_trends.iter().map(|t| t.contracts).sum();
        let by_status: i64 =
            report.status_distribution.iter().map(|s| s.count).sum();
        assert_eq!(by_month, contracts.len() as i64);
        assert_eq!(by_status, contracts.len() as i64);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let contracts = scenario();
        let first = serde_json::to_string(&aggregate(&contracts).unwrap())
            .unwrap();
        let second = serde_json::to_string(&aggregate(&contracts).unwrap())
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_input_yields_zeroed_report() {
        let report = aggregate(&[]).unwrap();

        assert!(report.contract_trends.is_empty());
        assert!(report.status_distribution.is_empty());
        assert!(report.top_counterparties.is_empty());
        assert!(report.top_commodities.is_empty());
        assert!(report.trader_performance.is_empty());
        assert_eq!(report.kpis.total_contracts, 0);
        assert_eq!(report.kpis.total_value, BigDecimal::zero());
        assert_eq!(report.kpis.avg_contract_value, BigDecimal::zero());
        assert_eq!(report.kpis.completion_rate, 0.0);
        assert_eq!(report.kpis.active_traders, 0);
    }

    #[test]
    fn rankings_are_truncated_and_descending() {
        let contracts: Vec<Contract> = (0..15)
            .map(|i| {
                contract(
                    i,
                    (2025, 3, 1),
                    &format!("{}", 100 + i),
                    "1",
                    ContractStatus::Approved,
                    Some(&format!("Counterparty {}", i)),
                )
            })
            .collect();

        let report = aggregate(&contracts).unwrap();
        let ranks = &report.top_counterparties;
        assert_eq!(ranks.len(), 10);
        for pair in ranks.windows(2) {
            assert!(pair[0].value >= pair[1].value);
        }
        assert_eq!(ranks[0].name, "Counterparty 14");
    }

    #[test]
    fn ranking_ties_keep_first_encountered_order() {
        let contracts = vec![
            contract(1, (2025, 3, 1), "10", "1", ContractStatus::Draft, Some("First")),
            contract(2, (2025, 3, 2), "10", "1", ContractStatus::Draft, Some("Second")),
            contract(3, (2025, 3, 3), "10", "1", ContractStatus::Draft, Some("Third")),
        ];

        let report = aggregate(&contracts).unwrap();
        let names: Vec<&str> = report
            .top_counterparties
            .iter()
            .map(|rank| rank.name.as_str())
            .collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn commodities_rank_by_volume() {
        let mut low_volume_high_value = contract(
            1,
            (2025, 3, 1),
            "1000",
            "1",
            ContractStatus::Draft,
            None,
        );
        low_volume_high_value.commodity_name = Some("Gold".to_string());
        let mut high_volume = contract(
            2,
            (2025, 3, 2),
            "1",
            "500",
            ContractStatus::Draft,
            None,
        );
        high_volume.commodity_name = Some("Wheat".to_string());

        let report =
            aggregate(&[low_volume_high_value, high_volume]).unwrap();
        assert_eq!(report.top_commodities[0].name, "Wheat");
        assert_eq!(report.top_commodities[0].volume, dec("500"));
        assert_eq!(report.top_commodities[1].name, "Gold");
    }

    #[test]
    fn missing_and_empty_names_fall_back_to_unknown() {
        let mut anonymous =
            contract(1, (2025, 3, 1), "10", "2", ContractStatus::Draft, None);
        anonymous.counterparty_name = Some(String::new());

        let report = aggregate(&[anonymous]).unwrap();
        assert_eq!(report.top_counterparties[0].name, "Unknown");
        assert_eq!(report.top_commodities[0].name, "Unknown");
        assert_eq!(report.trader_performance[0].name, "Unknown");
        assert_eq!(report.kpis.active_traders, 1);
    }

    #[test]
    fn malformed_price_fails_naming_the_contract() {
        let contracts = vec![
            contract(1, (2025, 3, 1), "10", "1", ContractStatus::Draft, None),
            contract(2, (2025, 3, 2), "n/a", "1", ContractStatus::Draft, None),
        ];

        let err = aggregate(&contracts).unwrap_err();
        match err {
            Error::InvalidData { id, field, value } => {
                assert_eq!(id, 2);
                assert_eq!(field, "price");
                assert_eq!(value, "n/a");
            },
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn negative_quantity_fails_naming_the_contract() {
        let contracts = vec![contract(
            9,
            (2025, 3, 1),
            "10",
            "-3",
            ContractStatus::Draft,
            None,
        )];

        let err = aggregate(&contracts).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidData { id: 9, field: "quantity", .. }
        ));
    }

    #[test]
    fn line_values_are_exact_decimals() {
        let contracts = vec![contract(
            1,
            (2025, 3, 1),
            "0.1",
            "0.2",
            ContractStatus::Draft,
            None,
        )];

        let report = aggregate(&contracts).unwrap();
        assert_eq!(report.kpis.total_value, dec("0.02"));
    }

    #[test]
    fn trends_sort_chronologically_across_year_boundaries() {
        let contracts = vec![
            contract(1, (2025, 1, 5), "1", "1", ContractStatus::Draft, None),
            contract(2, (2024, 12, 5), "1", "1", ContractStatus::Draft, None),
            contract(3, (2024, 2, 5), "1", "1", ContractStatus::Draft, None),
        ];

        let report = aggregate(&contracts).unwrap();
        let months: Vec<&str> = report
            .contract_trends
            .iter()
            .map(|t| t.month.as_str())
            .collect();
        assert_eq!(months, vec!["Feb 24", "Dec 24", "Jan 25"]);
    }
}
