//! Derived indexes over a record set
//!
//! Built in one go from the full record set and never mutated afterwards. A
//! reload builds a fresh [`Index`] rather than patching an old one.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::model::{AttendanceRecord, SeriesPoint, Totals, YearFilter};

/// Key of a per-(year, neighborhood) aggregate.
///
/// Ordered by year, then neighborhood.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AggregateKey {
    pub year: i32,
    pub neighborhood: String,
}

/// Sums over all records sharing a (year, neighborhood) key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborhoodYearAggregate {
    pub year: i32,
    pub neighborhood: String,
    pub totals: Totals,
}

#[derive(Debug, Clone, Default)]
pub struct Index {
    by_year_neighborhood: BTreeMap<AggregateKey, Totals>,
    series: HashMap<String, Vec<SeriesPoint>>,
    year_totals: BTreeMap<i32, Totals>,
    all_years: Totals,
    years: Vec<i32>,
    neighborhoods: Vec<String>,
}

impl Index {
    pub fn build(records: &[AttendanceRecord]) -> Self {
        let mut by_year_neighborhood: BTreeMap<AggregateKey, Totals> = BTreeMap::new();
        for r in records {
            by_year_neighborhood
                .entry(AggregateKey {
                    year: r.year,
                    neighborhood: r.neighborhood.clone(),
                })
                .or_default()
                .add(r.visits, r.unique_patients);
        }

        // Years stay in first-seen order per neighborhood; repeated years are summed
        let mut series: HashMap<String, Vec<SeriesPoint>> = HashMap::new();
        for r in records {
            let points = series.entry(r.neighborhood.clone()).or_default();
            match points.iter_mut().find(|p| p.year == r.year) {
                Some(point) => {
                    point.visits = point.visits.saturating_add(r.visits);
                    point.unique_patients = point.unique_patients.saturating_add(r.unique_patients);
                }
                None => points.push(SeriesPoint {
                    year: r.year,
                    visits: r.visits,
                    unique_patients: r.unique_patients,
                }),
            }
        }

        let mut year_totals: BTreeMap<i32, Totals> = BTreeMap::new();
        for r in records {
            year_totals
                .entry(r.year)
                .or_default()
                .add(r.visits, r.unique_patients);
        }

        let mut all_years = Totals::default();
        for r in records {
            all_years.add(r.visits, r.unique_patients);
        }

        let years: Vec<i32> = year_totals.keys().copied().collect();
        let neighborhoods: Vec<String> = records
            .iter()
            .map(|r| r.neighborhood.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Self {
            by_year_neighborhood,
            series,
            year_totals,
            all_years,
            years,
            neighborhoods,
        }
    }

    /// Distinct years, ascending
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// Distinct neighborhoods, lexicographic
    pub fn neighborhoods(&self) -> &[String] {
        &self.neighborhoods
    }

    /// Global totals for a year, or for every year
    pub fn totals(&self, filter: YearFilter) -> Totals {
        match filter {
            YearFilter::All => self.all_years,
            YearFilter::Year(y) => self.year_totals.get(&y).copied().unwrap_or_default(),
        }
    }

    pub fn has_year(&self, year: i32) -> bool {
        self.year_totals.contains_key(&year)
    }

    /// All per-(year, neighborhood) aggregates in key order
    pub fn aggregates(&self) -> impl Iterator<Item = (&AggregateKey, &Totals)> {
        self.by_year_neighborhood.iter()
    }

    pub fn aggregate(&self, year: i32, neighborhood: &str) -> Option<NeighborhoodYearAggregate> {
        let key = AggregateKey {
            year,
            neighborhood: neighborhood.to_string(),
        };
        self.by_year_neighborhood
            .get(&key)
            .map(|totals| NeighborhoodYearAggregate {
                year,
                neighborhood: key.neighborhood,
                totals: *totals,
            })
    }

    pub fn series(&self, neighborhood: &str) -> &[SeriesPoint] {
        self.series
            .get(neighborhood)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Series point for a neighborhood and year, looked up by year value
    pub fn series_point(&self, neighborhood: &str, year: i32) -> Option<&SeriesPoint> {
        self.series(neighborhood).iter().find(|p| p.year == year)
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}
