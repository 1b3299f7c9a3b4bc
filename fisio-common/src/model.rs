//! Attendance records and query result types
//!
//! Result types serialize with camelCase field names; they are the JSON bodies
//! of the HTTP service and are decoded back by the remote strategy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Sentinel spelling of the "all years" filter
pub const ALL_YEARS: &str = "ALL_YEARS";

/// Default number of entries returned by a top-neighborhoods query
pub const DEFAULT_TOP_N: usize = 5;

/// One retained row of source data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    /// Calendar year (always positive)
    pub year: i32,
    /// Canonical neighborhood key, never the raw label
    pub neighborhood: String,
    pub visits: u64,
    pub unique_patients: u64,
}

/// Visits and unique patients summed over some set of records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub visits: u64,
    pub unique_patients: u64,
}

impl Totals {
    /// Saturates at `u64::MAX` rather than overflowing
    pub fn add(&mut self, visits: u64, unique_patients: u64) {
        self.visits = self.visits.saturating_add(visits);
        self.unique_patients = self.unique_patients.saturating_add(unique_patients);
    }

    pub fn merge(&mut self, other: &Totals) {
        self.add(other.visits, other.unique_patients);
    }

    /// Visits per unique patient, 0 when there are no patients
    pub fn visits_per_patient(&self) -> f64 {
        if self.unique_patients > 0 {
            self.visits as f64 / self.unique_patients as f64
        } else {
            0.0
        }
    }
}

/// `current - previous`, clamped to the `i64` range
pub fn signed_delta(current: u64, previous: u64) -> i64 {
    let delta = i128::from(current) - i128::from(previous);
    delta.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

/// Canonical form of a neighborhood filter list: entries trimmed, blank
/// entries removed. An empty result means no neighborhood restriction.
///
/// Every query path applies this before matching, so the same list gives the
/// same filter in memory and after a round trip through the query string.
pub fn clean_neighborhoods<I, S>(neighborhoods: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    neighborhoods
        .into_iter()
        .filter_map(|n| {
            let n = n.as_ref().trim();
            (!n.is_empty()).then(|| n.to_string())
        })
        .collect()
}

/// Year filter: a specific calendar year or every year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum YearFilter {
    #[default]
    All,
    Year(i32),
}

impl YearFilter {
    /// Wire form: `None` for all years
    pub fn as_option(&self) -> Option<i32> {
        match self {
            YearFilter::All => None,
            YearFilter::Year(y) => Some(*y),
        }
    }

    pub fn matches(&self, year: i32) -> bool {
        match self {
            YearFilter::All => true,
            YearFilter::Year(y) => *y == year,
        }
    }
}

impl From<Option<i32>> for YearFilter {
    fn from(year: Option<i32>) -> Self {
        year.map_or(YearFilter::All, YearFilter::Year)
    }
}

impl fmt::Display for YearFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearFilter::All => f.write_str(ALL_YEARS),
            YearFilter::Year(y) => write!(f, "{}", y),
        }
    }
}

impl FromStr for YearFilter {
    type Err = Error;

    /// Accepts a year, `ALL_YEARS` or `all` (case-insensitive)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(ALL_YEARS) || s.eq_ignore_ascii_case("all") {
            return Ok(YearFilter::All);
        }
        s.parse::<i32>()
            .map(YearFilter::Year)
            .map_err(|_| Error::InvalidInput(format!("Invalid year filter: {}", s)))
    }
}

/// One point of a neighborhood's time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub year: i32,
    pub visits: u64,
    pub unique_patients: u64,
}

/// Relative change against a prior value
///
/// `NoBase` means the prior value exists but is zero, so no percentage can be
/// computed. It is never encoded as a numeric zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum PercentChange {
    Value(f64),
    NoBase,
}

impl PercentChange {
    pub fn between(previous: u64, delta: i64) -> Self {
        if previous == 0 {
            PercentChange::NoBase
        } else {
            PercentChange::Value(delta as f64 / previous as f64 * 100.0)
        }
    }
}

/// Comparison of a metric against the preceding year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearOverYear {
    pub previous: u64,
    pub delta: i64,
    pub percent: PercentChange,
}

impl YearOverYear {
    pub fn new(current: u64, previous: u64) -> Self {
        let delta = signed_delta(current, previous);
        Self {
            previous,
            delta,
            percent: PercentChange::between(previous, delta),
        }
    }
}

/// Headline numbers for a (year, neighborhoods) filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub visits_total: u64,
    pub unique_patients_total: u64,
    pub visits_per_patient: f64,
    /// Distinct neighborhoods with at least one matching record
    pub neighborhood_count: usize,
    /// `None` when there is no comparison base
    pub year_over_year_visits: Option<YearOverYear>,
    /// `None` when there is no comparison base
    pub year_over_year_patients: Option<YearOverYear>,
}

impl Summary {
    pub fn empty() -> Self {
        Self {
            visits_total: 0,
            unique_patients_total: 0,
            visits_per_patient: 0.0,
            neighborhood_count: 0,
            year_over_year_visits: None,
            year_over_year_patients: None,
        }
    }
}

/// Visits per year; every known year is present
pub type TimeSeries = BTreeMap<i32, u64>;

/// One entry of a top-neighborhoods ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopNeighborhood {
    pub neighborhood: String,
    pub visits: u64,
    pub unique_patients: u64,
    /// Percentage of the year-filter total
    pub share_of_total: f64,
}

/// One (year, neighborhood) row of the detail table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub year: i32,
    pub neighborhood: String,
    pub visits: u64,
    pub unique_patients: u64,
    /// `None`: no prior-year data for this neighborhood
    pub delta_visits: Option<i64>,
    /// `None` under the same conditions as `delta_visits`
    pub delta_visits_percent: Option<PercentChange>,
    /// Percentage of the year total across all neighborhoods
    pub share_of_total: f64,
}
