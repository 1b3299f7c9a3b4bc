//! # Fisio Dashboard Common Library
//!
//! Aggregation engine behind the attendance dashboard:
//! - Neighborhood label normalization
//! - Record store and derived indexes
//! - Analytical queries (summary, time series, top neighborhoods, table)
//! - Remote and local data source strategies with fallback selection
//! - Configuration loading and shared wire types

pub mod config;
pub mod error;
pub mod index;
pub mod ingest;
pub mod model;
pub mod normalize;
pub mod query;
pub mod source;
pub mod store;
pub mod wire;

pub use error::{Error, Result};
pub use model::YearFilter;
pub use source::{AttendanceSource, Dashboard, LocalSource, RemoteSource, SourceKind};
