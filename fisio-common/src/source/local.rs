//! Local strategy: bulk CSV loaded into memory

use async_trait::async_trait;
use reqwest::Client;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{AttendanceSource, SourceKind};
use crate::ingest::{read_csv, RawRow};
use crate::model::{Summary, TableRow, TimeSeries, TopNeighborhood, YearFilter};
use crate::query::QueryEngine;
use crate::store::{LoadReport, RecordStore, Snapshot};
use crate::{Error, Result};

/// Where the bulk CSV lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkLocation {
    Path(PathBuf),
    Url(String),
}

impl BulkLocation {
    /// `http://` and `https://` locations are URLs, anything else is a path
    pub fn parse(location: &str) -> Self {
        let trimmed = location.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            BulkLocation::Url(trimmed.to_string())
        } else {
            BulkLocation::Path(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for BulkLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BulkLocation::Path(p) => write!(f, "{}", p.display()),
            BulkLocation::Url(u) => f.write_str(u),
        }
    }
}

/// Answers every query from an in-memory snapshot
pub struct LocalSource {
    /// `None` for datasets handed over in memory; reload keeps them as is
    location: Option<BulkLocation>,
    client: Client,
    store: RecordStore,
}

impl LocalSource {
    /// Fetch, parse and index the bulk resource.
    ///
    /// Fails with [`Error::SourceUnavailable`] if the resource cannot be read.
    pub async fn open(location: BulkLocation, timeout: Duration) -> Result<Self> {
        let source = Self {
            location: Some(location),
            client: Client::builder().timeout(timeout).build()?,
            store: RecordStore::new(),
        };
        source.reload().await?;
        Ok(source)
    }

    /// Build from rows already in memory
    pub async fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = RawRow>,
    {
        let store = RecordStore::new();
        store.load(rows).await;
        Self {
            location: None,
            client: Client::new(),
            store,
        }
    }

    pub fn location(&self) -> Option<&BulkLocation> {
        self.location.as_ref()
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    async fn fetch(&self, location: &BulkLocation) -> Result<Vec<u8>> {
        match location {
            BulkLocation::Path(path) => tokio::fs::read(path).await.map_err(|e| {
                Error::SourceUnavailable(format!("Cannot read {}: {}", path.display(), e))
            }),
            BulkLocation::Url(url) => {
                debug!(url = %url, "Fetching bulk resource");
                let response = self.client.get(url).send().await?.error_for_status()?;
                Ok(response.bytes().await?.to_vec())
            }
        }
    }

    async fn load_from(&self, location: &BulkLocation) -> Result<LoadReport> {
        let bytes = self.fetch(location).await?;
        let (rows, rejected) = read_csv(&bytes);
        if rejected > 0 {
            warn!(rejected, location = %location, "Skipped unreadable CSV records");
        }

        let (snapshot, mut report) = Snapshot::from_raw_rows(rows);
        report.rows_read += rejected;
        report.rows_dropped += rejected;
        self.store.replace(snapshot).await;

        info!(
            location = %location,
            rows_read = report.rows_read,
            rows_dropped = report.rows_dropped,
            years = report.years,
            neighborhoods = report.neighborhoods,
            "Bulk resource loaded"
        );
        Ok(report)
    }

    async fn engine_snapshot(&self) -> Result<Arc<Snapshot>> {
        self.store.snapshot().await
    }
}

#[async_trait]
impl AttendanceSource for LocalSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Local
    }

    async fn years(&self) -> Result<Vec<i32>> {
        let snapshot = self.engine_snapshot().await?;
        Ok(QueryEngine::new(&snapshot).years())
    }

    async fn neighborhoods(&self) -> Result<Vec<String>> {
        let snapshot = self.engine_snapshot().await?;
        Ok(QueryEngine::new(&snapshot).neighborhoods())
    }

    async fn summary(&self, year: YearFilter, neighborhoods: &[String]) -> Result<Summary> {
        let snapshot = self.engine_snapshot().await?;
        Ok(QueryEngine::new(&snapshot).summary(year, neighborhoods))
    }

    async fn time_series(&self, neighborhoods: &[String]) -> Result<TimeSeries> {
        let snapshot = self.engine_snapshot().await?;
        Ok(QueryEngine::new(&snapshot).time_series(neighborhoods))
    }

    async fn top_neighborhoods(
        &self,
        year: YearFilter,
        neighborhoods: &[String],
        n: usize,
    ) -> Result<Vec<TopNeighborhood>> {
        let snapshot = self.engine_snapshot().await?;
        Ok(QueryEngine::new(&snapshot).top_neighborhoods(year, neighborhoods, n))
    }

    async fn table(&self, year: YearFilter, neighborhoods: &[String]) -> Result<Vec<TableRow>> {
        let snapshot = self.engine_snapshot().await?;
        Ok(QueryEngine::new(&snapshot).table(year, neighborhoods))
    }

    async fn reload(&self) -> Result<()> {
        match &self.location {
            Some(location) => self.load_from(location).await.map(|_| ()),
            None => {
                debug!("In-memory dataset, nothing to reload");
                Ok(())
            }
        }
    }
}
