//! HTTP wire types shared by the service and the remote strategy
//!
//! Both sides encode filters through [`QueryParams`], so a filter sent by the
//! remote strategy is decoded into exactly the arguments the local query
//! engine would have received.

use serde::{Deserialize, Serialize};

use crate::model::{clean_neighborhoods, YearFilter};

pub const YEARS_PATH: &str = "/years";
pub const NEIGHBORHOODS_PATH: &str = "/neighborhoods";
pub const SUMMARY_PATH: &str = "/summary";
pub const TIME_SERIES_PATH: &str = "/atendimentos-ano";
pub const TOP_NEIGHBORHOODS_PATH: &str = "/top-bairros";
pub const TABLE_PATH: &str = "/table";
pub const HEALTH_PATH: &str = "/health";
pub const RELOAD_PATH: &str = "/reload";

/// Query-string parameters of the query endpoints
///
/// # Examples
///
/// ```
/// use fisio_common::model::YearFilter;
/// use fisio_common::wire::QueryParams;
///
/// let params = QueryParams::new(YearFilter::Year(2023), &["CENTRO".to_string()], None);
/// assert_eq!(params.bairros.as_deref(), Some("CENTRO"));
/// assert_eq!(params.year_filter(), YearFilter::Year(2023));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    /// Omitted for all years
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Comma-joined neighborhood keys; omitted when unrestricted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bairros: Option<String>,
    /// Top-N size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<usize>,
}

impl QueryParams {
    pub fn new(year: YearFilter, neighborhoods: &[String], n: Option<usize>) -> Self {
        let neighborhoods = clean_neighborhoods(neighborhoods);
        let bairros = (!neighborhoods.is_empty()).then(|| neighborhoods.join(","));
        Self {
            year: year.as_option(),
            bairros,
            n,
        }
    }

    pub fn year_filter(&self) -> YearFilter {
        YearFilter::from(self.year)
    }

    /// Split the comma-joined list, cleaned the same way the query engine
    /// cleans an in-memory list
    pub fn neighborhoods(&self) -> Vec<String> {
        self.bairros
            .as_deref()
            .map(|joined| clean_neighborhoods(joined.split(',')))
            .unwrap_or_default()
    }
}

/// Error body returned by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
