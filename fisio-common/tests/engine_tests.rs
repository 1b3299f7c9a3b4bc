//! Query contract tests against the shared CSV fixture
//!
//! Fixture after normalization (dropped: missing year, "abc" year, blank label):
//!
//! | year | neighborhood   | visits | patients |
//! |------|----------------|--------|----------|
//! | 2021 | CENTRO         | 50     | 20       |
//! | 2022 | CENTRO         | 0      | 0        |
//! | 2022 | VILA SAO PAULO | 100    | 40       |
//! | 2022 | JARDIM AMERICA | 80     | 30       |
//! | 2023 | CENTRO         | 120    | 45       |
//! | 2023 | VILA SAO PAULO | 120    | 50       |
//! | 2023 | JARDIM AMERICA | 60     | 25       |
//! | 2023 | SANTA LUZIA    | 30     | 12       |
//! | 2023 | UNINFORMED     | 10     | 4        |

use fisio_common::model::PercentChange;
use fisio_common::source::BulkLocation;
use fisio_common::{AttendanceSource, LocalSource, YearFilter};
use std::path::PathBuf;
use std::time::Duration;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

async fn open_fixture(name: &str) -> LocalSource {
    LocalSource::open(BulkLocation::Path(fixture(name)), Duration::from_secs(2))
        .await
        .expect("fixture should load")
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// =============================================================================
// Catalogs
// =============================================================================

#[tokio::test]
async fn test_catalogs_are_sorted_and_normalized() {
    let source = open_fixture("atendimentos.csv").await;

    assert_eq!(source.years().await.unwrap(), vec![2021, 2022, 2023]);
    assert_eq!(
        source.neighborhoods().await.unwrap(),
        names(&["CENTRO", "JARDIM AMERICA", "SANTA LUZIA", "UNINFORMED", "VILA SAO PAULO"])
    );
}

// =============================================================================
// Summary
// =============================================================================

#[tokio::test]
async fn test_summary_for_year_with_comparison_base() {
    let source = open_fixture("atendimentos.csv").await;
    let summary = source.summary(YearFilter::Year(2023), &[]).await.unwrap();

    assert_eq!(summary.visits_total, 340);
    assert_eq!(summary.unique_patients_total, 136);
    assert_eq!(summary.visits_per_patient, 2.5);
    assert_eq!(summary.neighborhood_count, 5);

    let visits = summary.year_over_year_visits.unwrap();
    assert_eq!(visits.previous, 180);
    assert_eq!(visits.delta, 160);
    assert_eq!(visits.percent, PercentChange::Value(160.0 / 180.0 * 100.0));

    let patients = summary.year_over_year_patients.unwrap();
    assert_eq!(patients.previous, 70);
    assert_eq!(patients.delta, 66);
}

#[tokio::test]
async fn test_summary_first_year_has_no_comparison_base() {
    let source = open_fixture("atendimentos.csv").await;
    let summary = source.summary(YearFilter::Year(2021), &[]).await.unwrap();

    assert_eq!(summary.visits_total, 50);
    assert!(summary.year_over_year_visits.is_none());
    assert!(summary.year_over_year_patients.is_none());
}

#[tokio::test]
async fn test_summary_all_years_is_sum_of_years() {
    let source = open_fixture("atendimentos.csv").await;
    let all = source.summary(YearFilter::All, &[]).await.unwrap();
    assert_eq!(all.visits_total, 570);
    assert_eq!(all.unique_patients_total, 226);
    assert!(all.year_over_year_visits.is_none());

    let mut sum = 0;
    for year in source.years().await.unwrap() {
        sum += source
            .summary(YearFilter::Year(year), &[])
            .await
            .unwrap()
            .visits_total;
    }
    assert_eq!(sum, all.visits_total);
}

#[tokio::test]
async fn test_summary_with_neighborhood_filter() {
    let source = open_fixture("atendimentos.csv").await;
    let summary = source
        .summary(YearFilter::Year(2023), &names(&["VILA SAO PAULO"]))
        .await
        .unwrap();

    assert_eq!(summary.visits_total, 120);
    assert_eq!(summary.unique_patients_total, 50);
    assert_eq!(summary.neighborhood_count, 1);
    let yoy = summary.year_over_year_visits.unwrap();
    assert_eq!(yoy.delta, 20);
    assert_eq!(yoy.percent, PercentChange::Value(20.0));
}

// =============================================================================
// Time series
// =============================================================================

#[tokio::test]
async fn test_time_series_covers_every_year() {
    let source = open_fixture("atendimentos.csv").await;

    let all = source.time_series(&[]).await.unwrap();
    assert_eq!(all.keys().copied().collect::<Vec<_>>(), source.years().await.unwrap());
    assert_eq!(all[&2021], 50);
    assert_eq!(all[&2022], 180);
    assert_eq!(all[&2023], 340);

    let luzia = source.time_series(&names(&["SANTA LUZIA"])).await.unwrap();
    assert_eq!(luzia.into_iter().collect::<Vec<_>>(), vec![(2021, 0), (2022, 0), (2023, 30)]);
}

// =============================================================================
// Top neighborhoods
// =============================================================================

#[tokio::test]
async fn test_top_neighborhoods_ties_are_alphabetical() {
    let source = open_fixture("atendimentos.csv").await;
    let top = source
        .top_neighborhoods(YearFilter::Year(2023), &[], 3)
        .await
        .unwrap();

    let order: Vec<&str> = top.iter().map(|t| t.neighborhood.as_str()).collect();
    assert_eq!(order, vec!["CENTRO", "VILA SAO PAULO", "JARDIM AMERICA"]);
    assert_eq!(top[0].visits, 120);
    assert_eq!(top[0].unique_patients, 45);
    assert_eq!(top[0].share_of_total, 120.0 / 340.0 * 100.0);
}

#[tokio::test]
async fn test_top_neighborhoods_all_years() {
    let source = open_fixture("atendimentos.csv").await;
    let top = source.top_neighborhoods(YearFilter::All, &[], 5).await.unwrap();

    assert_eq!(top.len(), 5);
    assert_eq!(top[0].neighborhood, "VILA SAO PAULO");
    assert_eq!(top[0].visits, 220);
    assert_eq!(top[1].neighborhood, "CENTRO");
    assert_eq!(top[1].visits, 170);
    assert!(top.windows(2).all(|w| w[0].visits >= w[1].visits));
}

// =============================================================================
// Table
// =============================================================================

#[tokio::test]
async fn test_table_delta_against_prior_year() {
    let source = open_fixture("atendimentos.csv").await;
    let rows = source
        .table(YearFilter::Year(2023), &names(&["VILA SAO PAULO"]))
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].visits, 120);
    assert_eq!(rows[0].delta_visits, Some(20));
    assert_eq!(rows[0].delta_visits_percent, Some(PercentChange::Value(20.0)));
    assert_eq!(rows[0].share_of_total, 120.0 / 340.0 * 100.0);
}

#[tokio::test]
async fn test_table_without_prior_year_data() {
    let source = open_fixture("atendimentos.csv").await;
    let rows = source
        .table(YearFilter::Year(2023), &names(&["SANTA LUZIA"]))
        .await
        .unwrap();

    assert_eq!(rows[0].delta_visits, None);
    assert_eq!(rows[0].delta_visits_percent, None);
}

#[tokio::test]
async fn test_table_prior_year_zero_is_no_base() {
    let source = open_fixture("atendimentos.csv").await;
    let rows = source
        .table(YearFilter::Year(2023), &names(&["CENTRO"]))
        .await
        .unwrap();
    assert_eq!(rows[0].delta_visits, Some(120));
    assert_eq!(rows[0].delta_visits_percent, Some(PercentChange::NoBase));

    let rows = source
        .table(YearFilter::Year(2022), &names(&["CENTRO"]))
        .await
        .unwrap();
    assert_eq!(rows[0].delta_visits, Some(-50));
    assert_eq!(rows[0].delta_visits_percent, Some(PercentChange::Value(-100.0)));
}

#[tokio::test]
async fn test_table_all_years_canonical_order() {
    let source = open_fixture("atendimentos.csv").await;
    let rows = source.table(YearFilter::All, &[]).await.unwrap();

    let order: Vec<(i32, &str)> = rows
        .iter()
        .map(|r| (r.year, r.neighborhood.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![
            (2023, "CENTRO"),
            (2023, "VILA SAO PAULO"),
            (2023, "JARDIM AMERICA"),
            (2023, "SANTA LUZIA"),
            (2023, "UNINFORMED"),
            (2022, "VILA SAO PAULO"),
            (2022, "JARDIM AMERICA"),
            (2022, "CENTRO"),
            (2021, "CENTRO"),
        ]
    );
    assert!(rows.iter().all(|r| r.delta_visits.is_none()));
    assert!(rows.iter().all(|r| r.delta_visits_percent.is_none()));
    // Share uses the row's own year total
    assert_eq!(rows[8].share_of_total, 100.0);
}

// =============================================================================
// Empty dataset
// =============================================================================

#[tokio::test]
async fn test_empty_dataset_answers_with_zeroes() {
    let source = open_fixture("empty.csv").await;

    assert!(source.years().await.unwrap().is_empty());
    assert!(source.neighborhoods().await.unwrap().is_empty());

    for year in [YearFilter::All, YearFilter::Year(2023)] {
        let summary = source.summary(year, &[]).await.unwrap();
        assert_eq!(summary.visits_total, 0);
        assert_eq!(summary.unique_patients_total, 0);
        assert_eq!(summary.visits_per_patient, 0.0);
        assert!(summary.year_over_year_visits.is_none());
        assert!(source.top_neighborhoods(year, &[], 5).await.unwrap().is_empty());
        assert!(source.table(year, &[]).await.unwrap().is_empty());
    }
    assert!(source.time_series(&[]).await.unwrap().is_empty());
}
