//! Data source strategies
//!
//! Two interchangeable implementations answer the same queries:
//! - [`RemoteSource`] forwards each query to the HTTP service
//! - [`LocalSource`] loads the bulk CSV once and answers in memory
//!
//! Both must return identical results for the same dataset. [`Dashboard`]
//! picks one at initialization and hides the choice from callers.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

use crate::model::{Summary, TableRow, TimeSeries, TopNeighborhood, YearFilter};
use crate::Result;

mod dashboard;
mod local;
mod remote;

pub use dashboard::Dashboard;
pub use local::{BulkLocation, LocalSource};
pub use remote::RemoteSource;

/// Which strategy is serving queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Remote,
    Local,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Remote => f.write_str("remote"),
            SourceKind::Local => f.write_str("local"),
        }
    }
}

/// Query contract shared by both strategies
///
/// An empty neighborhood list means "no neighborhood filter".
#[async_trait]
pub trait AttendanceSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Distinct years, ascending
    async fn years(&self) -> Result<Vec<i32>>;

    /// Distinct neighborhood keys, lexicographic
    async fn neighborhoods(&self) -> Result<Vec<String>>;

    async fn summary(&self, year: YearFilter, neighborhoods: &[String]) -> Result<Summary>;

    async fn time_series(&self, neighborhoods: &[String]) -> Result<TimeSeries>;

    async fn top_neighborhoods(
        &self,
        year: YearFilter,
        neighborhoods: &[String],
        n: usize,
    ) -> Result<Vec<TopNeighborhood>>;

    async fn table(&self, year: YearFilter, neighborhoods: &[String]) -> Result<Vec<TableRow>>;

    /// Refresh from the backing source. On failure the previous state is kept.
    async fn reload(&self) -> Result<()>;
}
