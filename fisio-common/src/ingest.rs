//! Raw row extraction
//!
//! Turns untyped tabular rows into [`AttendanceRecord`]s. Rows with a missing or
//! invalid year, or a label that normalizes to nothing, are dropped; bad counts
//! become zero.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::model::AttendanceRecord;
use crate::normalize::normalize_neighborhood;
use crate::{Error, Result};

/// One untyped input row. Every cell is optional text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Ano", alias = "year", default)]
    pub year: Option<String>,
    #[serde(rename = "Bairro_oficial", alias = "neighborhood", default)]
    pub neighborhood: Option<String>,
    #[serde(rename = "Atendimentos", alias = "visits", default)]
    pub visits: Option<String>,
    #[serde(rename = "Pacientes_unicos", alias = "unique_patients", default)]
    pub unique_patients: Option<String>,
}

impl RawRow {
    pub fn new(
        year: Option<&str>,
        neighborhood: Option<&str>,
        visits: Option<&str>,
        unique_patients: Option<&str>,
    ) -> Self {
        Self {
            year: year.map(str::to_string),
            neighborhood: neighborhood.map(str::to_string),
            visits: visits.map(str::to_string),
            unique_patients: unique_patients.map(str::to_string),
        }
    }
}

/// Convert one raw row into a record.
///
/// Returns [`Error::MalformedRow`] when the row must be dropped.
pub fn parse_row(raw: &RawRow) -> Result<AttendanceRecord> {
    let year = raw
        .year
        .as_deref()
        .and_then(parse_year)
        .ok_or_else(|| Error::MalformedRow(format!("invalid year {:?}", raw.year)))?;

    let neighborhood = normalize_neighborhood(raw.neighborhood.as_deref());
    if neighborhood.is_empty() {
        return Err(Error::MalformedRow(format!(
            "empty neighborhood label {:?}",
            raw.neighborhood
        )));
    }

    Ok(AttendanceRecord {
        year,
        neighborhood,
        visits: parse_count(raw.visits.as_deref()),
        unique_patients: parse_count(raw.unique_patients.as_deref()),
    })
}

/// Convert a batch of raw rows, dropping malformed ones.
///
/// Returns the retained records and the number of dropped rows.
pub fn parse_rows<I>(rows: I) -> (Vec<AttendanceRecord>, usize)
where
    I: IntoIterator<Item = RawRow>,
{
    let mut records = Vec::new();
    let mut dropped = 0;
    for (line, raw) in rows.into_iter().enumerate() {
        match parse_row(&raw) {
            Ok(record) => records.push(record),
            Err(e) => {
                debug!(row = line, error = %e, "Dropping row");
                dropped += 1;
            }
        }
    }
    (records, dropped)
}

/// Read CSV text (header row required) into raw rows.
///
/// Records the CSV reader itself rejects are skipped and counted. An
/// unreadable header row yields no rows at all.
pub fn read_csv(bytes: &[u8]) -> (Vec<RawRow>, usize) {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(bytes);

    if let Err(e) = reader.headers() {
        warn!(error = %e, "Unreadable CSV header, treating resource as empty");
        return (Vec::new(), 0);
    }

    let mut rows = Vec::new();
    let mut rejected = 0;
    for (line, result) in reader.deserialize::<RawRow>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                debug!(row = line, error = %e, "Skipping unreadable CSV record");
                rejected += 1;
            }
        }
    }
    (rows, rejected)
}

fn parse_year(cell: &str) -> Option<i32> {
    let cell = cell.trim();
    let year = match cell.parse::<i32>() {
        Ok(y) => y,
        Err(_) => {
            let f = cell.parse::<f64>().ok()?;
            if f.fract() != 0.0 || f < 1.0 || f > i32::MAX as f64 {
                return None;
            }
            f as i32
        }
    };
    (year > 0).then_some(year)
}

fn parse_count(cell: Option<&str>) -> u64 {
    let Some(cell) = cell.map(str::trim).filter(|c| !c.is_empty()) else {
        return 0;
    };
    if let Ok(n) = cell.parse::<u64>() {
        return n;
    }
    match cell.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 => f as u64,
        _ => 0,
    }
}
