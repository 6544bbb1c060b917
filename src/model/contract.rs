use std::{fmt, io, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Contract lifecycle status as served by the CRM API.
///
/// The variant order is the display order used by the status
/// distribution view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    Draft,
    Approved,
    Executed,
    Completed,
    Cancelled,
}

impl ContractStatus {
    pub const ALL: [ContractStatus; 5] = [
        ContractStatus::Draft,
        ContractStatus::Approved,
        ContractStatus::Executed,
        ContractStatus::Completed,
        ContractStatus::Cancelled,
    ];

    /// Returns the canonical string representation of this status.
    /// Single source of truth for status string mappings.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Draft => "draft",
            ContractStatus::Approved => "approved",
            ContractStatus::Executed => "executed",
            ContractStatus::Completed => "completed",
            ContractStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<ContractStatus> for String {
    fn from(value: ContractStatus) -> Self {
        value.as_str().to_string()
    }
}

impl FromStr for ContractStatus {
    type Err = io::Error;

    fn from_str(value: &str) -> Result<ContractStatus, Self::Err> {
        match value {
            "draft" => Ok(ContractStatus::Draft),
            "approved" => Ok(ContractStatus::Approved),
            "executed" => Ok(ContractStatus::Executed),
            "completed" => Ok(ContractStatus::Completed),
            "cancelled" => Ok(ContractStatus::Cancelled),
            _ => Err(io::Error::other("Contract status not supported")),
        }
    }
}

/// A contract record as listed by the CRM API.
///
/// `price` and `quantity` arrive as decimal strings and stay that way on
/// the record; the aggregation engine parses them so a malformed value
/// can be reported against the offending contract id. The denormalized
/// display names are optional on the wire and fall back to the
/// "Unknown" category during aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub id: i64,
    #[serde(default)]
    pub contract_number: String,
    pub date: NaiveDate,
    pub price: String,
    pub quantity: String,
    pub status: ContractStatus,
    #[serde(default)]
    pub counterparty_name: Option<String>,
    #[serde(default)]
    pub commodity_name: Option<String>,
    #[serde(default)]
    pub trader_name: Option<String>,
}

/// One page of the CRM list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractsPage {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<Contract>,
}
