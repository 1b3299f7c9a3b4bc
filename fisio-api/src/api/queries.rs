//! Query endpoints
//!
//! Each handler decodes [`QueryParams`] and forwards to the same strategy
//! method a local caller would use, so remote answers match local ones.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use fisio_common::model::{Summary, TableRow, TimeSeries, TopNeighborhood, DEFAULT_TOP_N};
use fisio_common::wire::QueryParams;

use super::ApiError;
use crate::AppState;

/// GET /years
pub async fn get_years(State(state): State<AppState>) -> Result<Json<Vec<i32>>, ApiError> {
    Ok(Json(state.source.years().await?))
}

/// GET /neighborhoods
pub async fn get_neighborhoods(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.source.neighborhoods().await?))
}

/// GET /summary?year=&bairros=
pub async fn get_summary(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<Summary>, ApiError> {
    let summary = state
        .source
        .summary(params.year_filter(), &params.neighborhoods())
        .await?;
    Ok(Json(summary))
}

/// GET /atendimentos-ano?bairros=
///
/// Visits per year; the year parameter is ignored.
pub async fn get_time_series(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<TimeSeries>, ApiError> {
    Ok(Json(state.source.time_series(&params.neighborhoods()).await?))
}

/// GET /top-bairros?year=&bairros=&n=
pub async fn get_top_neighborhoods(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<Vec<TopNeighborhood>>, ApiError> {
    let n = params.n.unwrap_or(DEFAULT_TOP_N);
    let top = state
        .source
        .top_neighborhoods(params.year_filter(), &params.neighborhoods(), n)
        .await?;
    Ok(Json(top))
}

/// GET /table?year=&bairros=
pub async fn get_table(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<Vec<TableRow>>, ApiError> {
    let rows = state
        .source
        .table(params.year_filter(), &params.neighborhoods())
        .await?;
    Ok(Json(rows))
}

/// POST /reload
///
/// Re-reads the backing data. The previous data keeps being served on failure.
pub async fn post_reload(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.source.reload().await?;
    info!("Data reloaded on request");
    Ok(StatusCode::NO_CONTENT)
}
