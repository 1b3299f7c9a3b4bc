//! Source strategy selection
//!
//! `Dashboard` is constructed once at startup. `initialize()` tries the remote
//! API first and falls back to the local bulk file on any failure; the choice
//! then holds for the whole session.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::{AttendanceSource, BulkLocation, LocalSource, RemoteSource, SourceKind};
use crate::config::DashboardConfig;
use crate::model::{Summary, TableRow, TimeSeries, TopNeighborhood, YearFilter};
use crate::{Error, Result};

/// Facade over the selected strategy
pub struct Dashboard {
    config: DashboardConfig,
    active: RwLock<Option<Arc<dyn AttendanceSource>>>,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            active: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Select and initialize a strategy.
    ///
    /// Calling this again after success returns the selected kind without
    /// re-attempting the remote API.
    pub async fn initialize(&self) -> Result<SourceKind> {
        let mut active = self.active.write().await;
        if let Some(source) = active.as_ref() {
            return Ok(source.kind());
        }

        let remote_error = match self.connect_remote().await {
            Ok(remote) => {
                info!(base_url = %remote.base_url(), "Serving queries from remote API");
                *active = Some(Arc::new(remote));
                return Ok(SourceKind::Remote);
            }
            Err(e) => {
                warn!("Remote API unavailable, falling back to local data: {}", e);
                e
            }
        };

        let location = BulkLocation::parse(&self.config.data_file);
        match LocalSource::open(location.clone(), self.config.request_timeout).await {
            Ok(local) => {
                info!(location = %location, "Serving queries from local data");
                *active = Some(Arc::new(local));
                Ok(SourceKind::Local)
            }
            Err(local_error) => Err(Error::InitializationFailed {
                remote: remote_error.to_string(),
                local: local_error.to_string(),
            }),
        }
    }

    async fn connect_remote(&self) -> Result<RemoteSource> {
        let base_url = self.config.api_base_url.as_deref().ok_or_else(|| {
            Error::ConfigurationMissing("API base URL is not set".to_string())
        })?;
        RemoteSource::connect(base_url, self.config.request_timeout).await
    }

    /// Kind of the selected strategy, `None` before initialization
    pub async fn active_kind(&self) -> Option<SourceKind> {
        self.active.read().await.as_ref().map(|s| s.kind())
    }

    async fn source(&self) -> Result<Arc<dyn AttendanceSource>> {
        self.active.read().await.clone().ok_or(Error::Uninitialized)
    }

    /// Reload the selected strategy; the previous data stays on failure
    pub async fn reload(&self) -> Result<()> {
        let source = self.source().await?;
        source.reload().await?;
        info!(kind = %source.kind(), "Data source reloaded");
        Ok(())
    }

    pub async fn years(&self) -> Result<Vec<i32>> {
        self.source().await?.years().await
    }

    pub async fn neighborhoods(&self) -> Result<Vec<String>> {
        self.source().await?.neighborhoods().await
    }

    pub async fn summary(&self, year: YearFilter, neighborhoods: &[String]) -> Result<Summary> {
        self.source().await?.summary(year, neighborhoods).await
    }

    pub async fn time_series(&self, neighborhoods: &[String]) -> Result<TimeSeries> {
        self.source().await?.time_series(neighborhoods).await
    }

    pub async fn top_neighborhoods(
        &self,
        year: YearFilter,
        neighborhoods: &[String],
        n: usize,
    ) -> Result<Vec<TopNeighborhood>> {
        self.source()
            .await?
            .top_neighborhoods(year, neighborhoods, n)
            .await
    }

    pub async fn table(&self, year: YearFilter, neighborhoods: &[String]) -> Result<Vec<TableRow>> {
        self.source().await?.table(year, neighborhoods).await
    }
}
