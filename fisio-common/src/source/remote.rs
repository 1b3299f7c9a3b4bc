//! Remote strategy: every query is one HTTP request to the dashboard API

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

use super::{AttendanceSource, SourceKind};
use crate::model::{Summary, TableRow, TimeSeries, TopNeighborhood, YearFilter};
use crate::wire::{
    QueryParams, NEIGHBORHOODS_PATH, SUMMARY_PATH, TABLE_PATH, TIME_SERIES_PATH,
    TOP_NEIGHBORHOODS_PATH, YEARS_PATH,
};
use crate::{Error, Result};

/// Client for the dashboard HTTP API
///
/// Requests time out after the configured duration. Dropping a pending query
/// future aborts its request; nothing local is touched either way.
pub struct RemoteSource {
    base_url: String,
    client: Client,
}

impl RemoteSource {
    /// Connect to the API, checking that both catalog endpoints answer.
    ///
    /// Fails with [`Error::ConfigurationMissing`] for an empty base URL and
    /// with [`Error::SourceUnavailable`] if either catalog request fails.
    pub async fn connect(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(Error::ConfigurationMissing(
                "API base URL is not set".to_string(),
            ));
        }

        let source = Self {
            base_url: base_url.to_string(),
            client: Client::builder().timeout(timeout).build()?,
        };
        source.check_catalogs().await?;
        info!(base_url = %source.base_url, "Connected to dashboard API");
        Ok(source)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Reachability check; the lists themselves are fetched per query
    async fn check_catalogs(&self) -> Result<()> {
        let params = QueryParams::default();
        let (years, neighborhoods) = tokio::try_join!(
            self.get_json::<Vec<i32>>(YEARS_PATH, &params),
            self.get_json::<Vec<String>>(NEIGHBORHOODS_PATH, &params),
        )?;
        debug!(
            years = years.len(),
            neighborhoods = neighborhoods.len(),
            "Dashboard API catalogs reachable"
        );
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &QueryParams) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, ?params, "GET");
        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl AttendanceSource for RemoteSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Remote
    }

    async fn years(&self) -> Result<Vec<i32>> {
        self.get_json(YEARS_PATH, &QueryParams::default()).await
    }

    async fn neighborhoods(&self) -> Result<Vec<String>> {
        self.get_json(NEIGHBORHOODS_PATH, &QueryParams::default())
            .await
    }

    async fn summary(&self, year: YearFilter, neighborhoods: &[String]) -> Result<Summary> {
        self.get_json(SUMMARY_PATH, &QueryParams::new(year, neighborhoods, None))
            .await
    }

    async fn time_series(&self, neighborhoods: &[String]) -> Result<TimeSeries> {
        self.get_json(
            TIME_SERIES_PATH,
            &QueryParams::new(YearFilter::All, neighborhoods, None),
        )
        .await
    }

    async fn top_neighborhoods(
        &self,
        year: YearFilter,
        neighborhoods: &[String],
        n: usize,
    ) -> Result<Vec<TopNeighborhood>> {
        self.get_json(
            TOP_NEIGHBORHOODS_PATH,
            &QueryParams::new(year, neighborhoods, Some(n)),
        )
        .await
    }

    async fn table(&self, year: YearFilter, neighborhoods: &[String]) -> Result<Vec<TableRow>> {
        self.get_json(TABLE_PATH, &QueryParams::new(year, neighborhoods, None))
            .await
    }

    /// The API owns its data; reloading only re-checks that it answers
    async fn reload(&self) -> Result<()> {
        self.check_catalogs().await
    }
}
