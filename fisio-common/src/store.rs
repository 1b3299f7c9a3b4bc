//! Record store
//!
//! Owns the retained records of the current load together with their derived
//! [`Index`]. The pair is published as one immutable [`Snapshot`]; a load
//! builds the next snapshot completely before swapping it in, so a reader sees
//! either the old data or the new data, never a mix.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;

use crate::index::Index;
use crate::ingest::{parse_rows, RawRow};
use crate::model::AttendanceRecord;
use crate::{Error, Result};

/// Outcome of one load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub years: usize,
    pub neighborhoods: usize,
}

/// Immutable record set plus indexes
#[derive(Debug, Default)]
pub struct Snapshot {
    records: Vec<AttendanceRecord>,
    index: Index,
}

impl Snapshot {
    pub fn from_records(records: Vec<AttendanceRecord>) -> Self {
        let index = Index::build(&records);
        Self { records, index }
    }

    /// Parse, normalize and index raw rows. Malformed rows are dropped.
    pub fn from_raw_rows<I>(rows: I) -> (Self, LoadReport)
    where
        I: IntoIterator<Item = RawRow>,
    {
        let (records, dropped) = parse_rows(rows);
        let snapshot = Self::from_records(records);
        let report = LoadReport {
            rows_read: snapshot.records.len() + dropped,
            rows_dropped: dropped,
            years: snapshot.index.years().len(),
            neighborhoods: snapshot.index.neighborhoods().len(),
        };
        (snapshot, report)
    }

    pub fn records(&self) -> &[AttendanceRecord] {
        &self.records
    }

    pub fn index(&self) -> &Index {
        &self.index
    }
}

/// Holder of the current snapshot
///
/// Starts out unloaded; queries against an unloaded store fail with
/// [`Error::Uninitialized`] instead of answering with empty data.
#[derive(Debug, Default)]
pub struct RecordStore {
    current: RwLock<Option<Arc<Snapshot>>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all state with the given rows
    pub async fn load<I>(&self, rows: I) -> LoadReport
    where
        I: IntoIterator<Item = RawRow>,
    {
        let (snapshot, report) = Snapshot::from_raw_rows(rows);
        self.replace(snapshot).await;
        info!(
            rows_read = report.rows_read,
            rows_dropped = report.rows_dropped,
            years = report.years,
            neighborhoods = report.neighborhoods,
            "Attendance records loaded"
        );
        report
    }

    /// Swap in a fully built snapshot
    pub async fn replace(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        *self.current.write().await = Some(snapshot);
    }

    /// Current snapshot; the caller keeps it alive across a concurrent reload
    pub async fn snapshot(&self) -> Result<Arc<Snapshot>> {
        self.current.read().await.clone().ok_or(Error::Uninitialized)
    }

    pub async fn is_loaded(&self) -> bool {
        self.current.read().await.is_some()
    }
}
