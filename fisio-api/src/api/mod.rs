//! HTTP API handlers for fisio-api

pub mod error;
pub mod health;
pub mod queries;

pub use error::ApiError;
pub use health::health_routes;
pub use queries::{
    get_neighborhoods, get_summary, get_table, get_time_series, get_top_neighborhoods, get_years,
    post_reload,
};
