//! Analytical queries over a snapshot
//!
//! Every query is a pure read of one [`Snapshot`]; the same snapshot and
//! arguments always give the same answer.
//!
//! Filter semantics shared by all queries: a record matches when the year
//! filter matches its year and, if the neighborhood list is non-empty, its
//! neighborhood is in the list. Share-of-total denominators use the global
//! total for the year filter, ignoring the neighborhood filter.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use crate::index::Index;
use crate::model::{
    clean_neighborhoods, signed_delta, PercentChange, Summary, TableRow, TimeSeries,
    TopNeighborhood, Totals, YearFilter, YearOverYear,
};
use crate::store::Snapshot;

/// Neighborhood restriction over the cleaned list; empty means no restriction
struct NeighborhoodFilter {
    selected: HashSet<String>,
}

impl NeighborhoodFilter {
    fn new(neighborhoods: &[String]) -> Self {
        Self {
            selected: clean_neighborhoods(neighborhoods).into_iter().collect(),
        }
    }

    fn matches(&self, neighborhood: &str) -> bool {
        self.selected.is_empty() || self.selected.contains(neighborhood)
    }
}

/// Query engine bound to one snapshot
pub struct QueryEngine<'a> {
    index: &'a Index,
}

impl<'a> QueryEngine<'a> {
    pub fn new(snapshot: &'a Snapshot) -> Self {
        Self {
            index: snapshot.index(),
        }
    }

    pub fn years(&self) -> Vec<i32> {
        self.index.years().to_vec()
    }

    pub fn neighborhoods(&self) -> Vec<String> {
        self.index.neighborhoods().to_vec()
    }

    /// Totals of the records matching the filter, plus how many distinct
    /// neighborhoods contributed
    fn filtered_totals(&self, year: YearFilter, filter: &NeighborhoodFilter) -> (Totals, usize) {
        let mut totals = Totals::default();
        let mut seen: HashSet<&str> = HashSet::new();
        for (key, agg) in self.index.aggregates() {
            if year.matches(key.year) && filter.matches(&key.neighborhood) {
                totals.merge(agg);
                seen.insert(key.neighborhood.as_str());
            }
        }
        (totals, seen.len())
    }

    /// Headline totals with year-over-year comparison.
    ///
    /// The comparison exists only for a specific year whose predecessor has
    /// data in the global (unfiltered) totals; the prior value itself is taken
    /// under the same neighborhood filter.
    pub fn summary(&self, year: YearFilter, neighborhoods: &[String]) -> Summary {
        let filter = NeighborhoodFilter::new(neighborhoods);
        let (current, neighborhood_count) = self.filtered_totals(year, &filter);

        let previous = match year {
            YearFilter::Year(y) => y
                .checked_sub(1)
                .filter(|prior| self.index.has_year(*prior))
                .map(|prior| self.filtered_totals(YearFilter::Year(prior), &filter).0),
            YearFilter::All => None,
        };

        Summary {
            visits_total: current.visits,
            unique_patients_total: current.unique_patients,
            visits_per_patient: current.visits_per_patient(),
            neighborhood_count,
            year_over_year_visits: previous.map(|p| YearOverYear::new(current.visits, p.visits)),
            year_over_year_patients: previous
                .map(|p| YearOverYear::new(current.unique_patients, p.unique_patients)),
        }
    }

    /// Visits per year for the selected neighborhoods, with every known year
    /// present (zero when nothing matches)
    pub fn time_series(&self, neighborhoods: &[String]) -> TimeSeries {
        let filter = NeighborhoodFilter::new(neighborhoods);
        let mut series: TimeSeries = self.index.years().iter().map(|y| (*y, 0)).collect();
        for (key, agg) in self.index.aggregates() {
            if filter.matches(&key.neighborhood) {
                let visits = series.entry(key.year).or_default();
                *visits = visits.saturating_add(agg.visits);
            }
        }
        series
    }

    /// Neighborhoods ranked by visits (descending, ties by name), at most `n`
    pub fn top_neighborhoods(
        &self,
        year: YearFilter,
        neighborhoods: &[String],
        n: usize,
    ) -> Vec<TopNeighborhood> {
        let filter = NeighborhoodFilter::new(neighborhoods);
        let mut by_neighborhood: BTreeMap<&str, Totals> = BTreeMap::new();
        for (key, agg) in self.index.aggregates() {
            if year.matches(key.year) && filter.matches(&key.neighborhood) {
                by_neighborhood
                    .entry(key.neighborhood.as_str())
                    .or_default()
                    .merge(agg);
            }
        }

        let denominator = self.index.totals(year).visits;
        let mut ranked: Vec<TopNeighborhood> = by_neighborhood
            .into_iter()
            .map(|(name, totals)| TopNeighborhood {
                neighborhood: name.to_string(),
                visits: totals.visits,
                unique_patients: totals.unique_patients,
                share_of_total: share(totals.visits, denominator),
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.visits
                .cmp(&a.visits)
                .then_with(|| a.neighborhood.cmp(&b.neighborhood))
        });
        ranked.truncate(n);
        ranked
    }

    /// Per-(year, neighborhood) rows with prior-year deltas and year share.
    ///
    /// Ordered by year descending, visits descending, then neighborhood.
    pub fn table(&self, year: YearFilter, neighborhoods: &[String]) -> Vec<TableRow> {
        let filter = NeighborhoodFilter::new(neighborhoods);
        let mut rows: Vec<TableRow> = self
            .index
            .aggregates()
            .filter(|(key, _)| year.matches(key.year) && filter.matches(&key.neighborhood))
            .map(|(key, agg)| {
                let (delta_visits, delta_visits_percent) = match year {
                    YearFilter::Year(_) => self.prior_year_delta(&key.neighborhood, key.year),
                    YearFilter::All => (None, None),
                };
                let year_total = self.index.totals(YearFilter::Year(key.year)).visits;
                TableRow {
                    year: key.year,
                    neighborhood: key.neighborhood.clone(),
                    visits: agg.visits,
                    unique_patients: agg.unique_patients,
                    delta_visits,
                    delta_visits_percent,
                    share_of_total: share(agg.visits, year_total),
                }
            })
            .collect();

        rows.sort_by(table_order);
        rows
    }

    /// Delta against the same neighborhood's previous year, from its series
    fn prior_year_delta(&self, neighborhood: &str, year: i32) -> (Option<i64>, Option<PercentChange>) {
        let current = self.index.series_point(neighborhood, year);
        let previous = year
            .checked_sub(1)
            .and_then(|prior| self.index.series_point(neighborhood, prior));
        match (current, previous) {
            (Some(current), Some(previous)) => {
                let delta = signed_delta(current.visits, previous.visits);
                (Some(delta), Some(PercentChange::between(previous.visits, delta)))
            }
            _ => (None, None),
        }
    }
}

fn table_order(a: &TableRow, b: &TableRow) -> Ordering {
    b.year
        .cmp(&a.year)
        .then_with(|| b.visits.cmp(&a.visits))
        .then_with(|| a.neighborhood.cmp(&b.neighborhood))
}

/// `part / total` as a percentage, 0 when the total is 0
fn share(part: u64, total: u64) -> f64 {
    if total > 0 {
        part as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttendanceRecord;

    fn rec(year: i32, neighborhood: &str, visits: u64, unique_patients: u64) -> AttendanceRecord {
        AttendanceRecord {
            year,
            neighborhood: neighborhood.to_string(),
            visits,
            unique_patients,
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot::from_records(vec![
            rec(2022, "NORTE", 100, 40),
            rec(2023, "NORTE", 120, 50),
            rec(2023, "SUL", 120, 30),
            rec(2023, "LESTE", 60, 20),
            rec(2022, "OESTE", 0, 0),
            rec(2023, "OESTE", 40, 10),
        ])
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_summary_specific_year() {
        let snap = snapshot();
        let engine = QueryEngine::new(&snap);
        let s = engine.summary(YearFilter::Year(2023), &[]);
        assert_eq!(s.visits_total, 340);
        assert_eq!(s.unique_patients_total, 110);
        assert_eq!(s.neighborhood_count, 4);
        let yoy = s.year_over_year_visits.unwrap();
        assert_eq!(yoy.previous, 100);
        assert_eq!(yoy.delta, 240);
        assert_eq!(yoy.percent, PercentChange::Value(240.0));
    }

    #[test]
    fn test_summary_without_base_year() {
        let snap = snapshot();
        let engine = QueryEngine::new(&snap);
        let s = engine.summary(YearFilter::Year(2022), &[]);
        assert!(s.year_over_year_visits.is_none());
        assert!(s.year_over_year_patients.is_none());
        assert!(engine.summary(YearFilter::All, &[]).year_over_year_visits.is_none());
    }

    #[test]
    fn test_summary_prior_year_zero_under_filter() {
        let snap = snapshot();
        let engine = QueryEngine::new(&snap);
        let s = engine.summary(YearFilter::Year(2023), &names(&["OESTE"]));
        let yoy = s.year_over_year_visits.unwrap();
        assert_eq!(yoy.previous, 0);
        assert_eq!(yoy.delta, 40);
        assert_eq!(yoy.percent, PercentChange::NoBase);
    }

    #[test]
    fn test_summary_unknown_neighborhood_is_zero() {
        let snap = snapshot();
        let engine = QueryEngine::new(&snap);
        let s = engine.summary(YearFilter::All, &names(&["NOWHERE"]));
        assert_eq!(s.visits_total, 0);
        assert_eq!(s.visits_per_patient, 0.0);
        assert_eq!(s.neighborhood_count, 0);
    }

    #[test]
    fn test_time_series_fills_missing_years() {
        let snap = snapshot();
        let engine = QueryEngine::new(&snap);
        let series = engine.time_series(&names(&["LESTE"]));
        assert_eq!(series.into_iter().collect::<Vec<_>>(), vec![(2022, 0), (2023, 60)]);
    }

    #[test]
    fn test_top_neighborhoods_tie_break_and_truncate() {
        let snap = snapshot();
        let engine = QueryEngine::new(&snap);
        let top = engine.top_neighborhoods(YearFilter::Year(2023), &[], 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].neighborhood, "NORTE");
        assert_eq!(top[1].neighborhood, "SUL");
        assert_eq!(top[0].share_of_total, 120.0 / 340.0 * 100.0);
    }

    #[test]
    fn test_top_neighborhoods_share_ignores_neighborhood_filter() {
        let snap = snapshot();
        let engine = QueryEngine::new(&snap);
        let top = engine.top_neighborhoods(YearFilter::Year(2023), &names(&["LESTE"]), 5);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].share_of_total, 60.0 / 340.0 * 100.0);
    }

    #[test]
    fn test_top_zero_n() {
        let snap = snapshot();
        let engine = QueryEngine::new(&snap);
        assert!(engine.top_neighborhoods(YearFilter::All, &[], 0).is_empty());
    }

    #[test]
    fn test_table_delta() {
        let snap = snapshot();
        let engine = QueryEngine::new(&snap);
        let rows = engine.table(YearFilter::Year(2023), &names(&["NORTE"]));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].delta_visits, Some(20));
        assert_eq!(rows[0].delta_visits_percent, Some(PercentChange::Value(20.0)));
    }

    #[test]
    fn test_table_no_prior_year() {
        let snap = snapshot();
        let engine = QueryEngine::new(&snap);
        let rows = engine.table(YearFilter::Year(2023), &names(&["SUL"]));
        assert_eq!(rows[0].delta_visits, None);
        assert_eq!(rows[0].delta_visits_percent, None);
    }

    #[test]
    fn test_table_prior_year_zero_visits() {
        let snap = snapshot();
        let engine = QueryEngine::new(&snap);
        let rows = engine.table(YearFilter::Year(2023), &names(&["OESTE"]));
        assert_eq!(rows[0].delta_visits, Some(40));
        assert_eq!(rows[0].delta_visits_percent, Some(PercentChange::NoBase));
    }

    #[test]
    fn test_table_all_years_has_no_deltas_and_canonical_order() {
        let snap = snapshot();
        let engine = QueryEngine::new(&snap);
        let rows = engine.table(YearFilter::All, &[]);
        let order: Vec<(i32, &str)> = rows.iter().map(|r| (r.year, r.neighborhood.as_str())).collect();
        assert_eq!(
            order,
            vec![
                (2023, "NORTE"),
                (2023, "SUL"),
                (2023, "LESTE"),
                (2023, "OESTE"),
                (2022, "NORTE"),
                (2022, "OESTE"),
            ]
        );
        assert!(rows.iter().all(|r| r.delta_visits.is_none()));
        assert_eq!(rows[4].share_of_total, 100.0);
    }

    #[test]
    fn test_blank_and_padded_filter_entries() {
        let snap = snapshot();
        let engine = QueryEngine::new(&snap);
        let unrestricted = engine.summary(YearFilter::All, &[]);
        assert_eq!(engine.summary(YearFilter::All, &names(&[""])), unrestricted);
        assert_eq!(engine.summary(YearFilter::All, &names(&["  "])), unrestricted);
        assert_eq!(
            engine.table(YearFilter::Year(2023), &names(&[" NORTE "])),
            engine.table(YearFilter::Year(2023), &names(&["NORTE"]))
        );
    }

    #[test]
    fn test_extreme_year_has_no_comparison_base() {
        let snap = snapshot();
        let engine = QueryEngine::new(&snap);
        let s = engine.summary(YearFilter::Year(i32::MIN), &[]);
        assert_eq!(s.visits_total, 0);
        assert!(s.year_over_year_visits.is_none());
        assert!(engine.table(YearFilter::Year(i32::MIN), &[]).is_empty());
    }

    #[test]
    fn test_delta_with_huge_counts() {
        let snap = Snapshot::from_records(vec![
            rec(2022, "NORTE", 0, 0),
            rec(2023, "NORTE", u64::MAX, 1),
        ]);
        let engine = QueryEngine::new(&snap);
        let rows = engine.table(YearFilter::Year(2023), &[]);
        assert_eq!(rows[0].delta_visits, Some(i64::MAX));
        assert_eq!(rows[0].delta_visits_percent, Some(PercentChange::NoBase));
        let yoy = engine.summary(YearFilter::Year(2023), &[]).year_over_year_visits.unwrap();
        assert_eq!(yoy.delta, i64::MAX);
    }

    #[test]
    fn test_empty_snapshot_queries() {
        let snap = Snapshot::from_records(Vec::new());
        let engine = QueryEngine::new(&snap);
        assert_eq!(engine.summary(YearFilter::All, &[]), Summary::empty());
        assert!(engine.time_series(&[]).is_empty());
        assert!(engine.top_neighborhoods(YearFilter::Year(2023), &[], 5).is_empty());
        assert!(engine.table(YearFilter::All, &[]).is_empty());
    }
}
