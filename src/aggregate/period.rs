use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use std::fmt;

use crate::{error::Error, model::Contract};

/// Relative time window applied to the contract set before aggregation.
///
/// Day-based windows subtract a fixed number of days, month-based windows
/// subtract calendar months. Only a lower bound is ever applied: a
/// future-dated contract passes every window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Last30Days,
    Last90Days,
    Last6Months,
    Last12Months,
    YearToDate,
    AllTime,
}

impl Period {
    pub const ALL: [Period; 6] = [
        Period::Last30Days,
        Period::Last90Days,
        Period::Last6Months,
        Period::Last12Months,
        Period::YearToDate,
        Period::AllTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Last30Days => "30d",
            Period::Last90Days => "90d",
            Period::Last6Months => "6m",
            Period::Last12Months => "12m",
            Period::YearToDate => "ytd",
            Period::AllTime => "all",
        }
    }

    /// Inclusive lower bound of the window, `None` for no bound.
    ///
    /// Contract dates have day granularity, so the bound is truncated to
    /// a date; a contract dated on the boundary day passes regardless of
    /// the time of day of `now`.
    pub fn lower_bound(&self, now: DateTime<Utc>) -> Option<NaiveDate> {
        match self {
            Period::Last30Days => Some((now - Duration::days(30)).date_naive()),
            Period::Last90Days => Some((now - Duration::days(90)).date_naive()),
            Period::Last6Months => now
                .checked_sub_months(Months::new(6))
                .map(|bound| bound.date_naive()),
            Period::Last12Months => now
                .checked_sub_months(Months::new(12))
                .map(|bound| bound.date_naive()),
            Period::YearToDate => NaiveDate::from_ymd_opt(now.year(), 1, 1),
            Period::AllTime => None,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse the period query parameter. Default is 12 months if no period
/// specified; an unrecognized value is an error, never a fallback.
pub fn parse_period(period: &Option<String>) -> Result<Period, Error> {
    match period.as_deref() {
        None | Some("12m") => Ok(Period::Last12Months),
        Some("30d") => Ok(Period::Last30Days),
        Some("90d") => Ok(Period::Last90Days),
        Some("6m") => Ok(Period::Last6Months),
        Some("ytd") => Ok(Period::YearToDate),
        Some("all") => Ok(Period::AllTime),
        Some(p) => Err(Error::InvalidOption {
            option: format!(
                "period '{}'. Valid options: 30d, 90d, 6m, 12m, ytd, all",
                p
            ),
        }),
    }
}

/// Keep the contracts dated at or after the window's lower bound.
/// No upper bound is applied.
pub fn filter_contracts(
    contracts: Vec<Contract>,
    period: Period,
    now: DateTime<Utc>,
) -> Vec<Contract> {
    match period.lower_bound(now) {
        None => contracts,
        Some(bound) => contracts
            .into_iter()
            .filter(|contract| contract.date >= bound)
            .collect(),
    }
}
