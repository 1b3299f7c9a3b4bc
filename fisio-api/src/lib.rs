//! fisio-api library - Dashboard data service
//!
//! Serves the query endpoints used by the dashboard's remote strategy from a
//! locally loaded dataset.

use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use fisio_common::wire::{
    NEIGHBORHOODS_PATH, RELOAD_PATH, SUMMARY_PATH, TABLE_PATH, TIME_SERIES_PATH,
    TOP_NEIGHBORHOODS_PATH, YEARS_PATH,
};
use fisio_common::AttendanceSource;

pub mod api;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Strategy answering the queries (normally a `LocalSource`)
    pub source: Arc<dyn AttendanceSource>,
}

impl AppState {
    /// Create new application state
    pub fn new(source: Arc<dyn AttendanceSource>) -> Self {
        Self { source }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let queries = Router::new()
        .route(YEARS_PATH, get(api::get_years))
        .route(NEIGHBORHOODS_PATH, get(api::get_neighborhoods))
        .route(SUMMARY_PATH, get(api::get_summary))
        .route(TIME_SERIES_PATH, get(api::get_time_series))
        .route(TOP_NEIGHBORHOODS_PATH, get(api::get_top_neighborhoods))
        .route(TABLE_PATH, get(api::get_table))
        .route(RELOAD_PATH, post(api::post_reload));

    Router::new()
        .merge(queries)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
