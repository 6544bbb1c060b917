//! Centralized cache key constants
//!
//! All cache keys used by controllers and cache_refresher are defined here
//! to prevent duplication and drift between the two locations.

/// Full analytics report, stored once per period as "report_{period}"
pub const REPORT: &str = "report";
