//! Loading, joining and filtering over Parquet fixtures

mod common;

use campaign_dashboard::charts::Charts;
use campaign_dashboard::config::DashboardConfig;
use campaign_dashboard::data::{distinct_jobs, Dataset, Filters, OUTCOME_COLUMN};
use campaign_dashboard::DashboardError;
use common::*;
use std::collections::BTreeSet;
use tempfile::TempDir;

#[tokio::test]
async fn test_join_keeps_only_matching_ids() {
    let (_dir, config) = fixture_dir();
    let dataset = Dataset::load(&config).await.unwrap();

    let joined_ids: Vec<i64> = int_column(dataset.joined().batches(), "customer_id")
        .into_iter()
        .map(Option::unwrap)
        .collect();

    let expected: Vec<i64> = CAMPAIGN_IDS
        .iter()
        .copied()
        .filter(|id| CUSTOMER_IDS.contains(id))
        .collect();
    assert_eq!(joined_ids, expected);

    // Every joined id exists on both sides
    for id in &joined_ids {
        assert!(CUSTOMER_IDS.contains(id));
        assert!(CAMPAIGN_IDS.contains(id));
    }
    assert_eq!(dataset.customer().num_rows(), 12);
    assert_eq!(dataset.campaign().num_rows(), 8);
}

#[tokio::test]
async fn test_join_carries_columns_from_both_tables() {
    let (_dir, config) = fixture_dir();
    let dataset = Dataset::load(&config).await.unwrap();

    let names = dataset.joined().column_names();
    assert_eq!(
        names,
        vec![
            "customer_id",
            "age",
            "job",
            "has_loan_or_housing",
            "duration",
            "deposit"
        ]
    );
    assert_eq!(dataset.outcome_column(), OUTCOME_COLUMN);

    let jobs = str_column(dataset.joined().batches(), "job");
    let ids = int_column(dataset.joined().batches(), "customer_id");
    for (id, job) in ids.iter().zip(&jobs) {
        assert_eq!(job.as_deref(), Some(job_of(id.unwrap())));
    }
}

#[tokio::test]
async fn test_outcome_mapping() {
    let (_dir, config) = fixture_dir();
    let dataset = Dataset::load(&config).await.unwrap();

    let ids = int_column(dataset.joined().batches(), "customer_id");
    let outcomes = int_column(dataset.joined().batches(), OUTCOME_COLUMN);
    for (id, outcome) in ids.iter().zip(&outcomes) {
        assert_eq!(*outcome, expected_outcome(id.unwrap()), "customer {id:?}");
    }

    // "maybe" and a missing value both become NULL
    assert_eq!(outcomes.iter().filter(|o| o.is_none()).count(), 2);
    assert!(outcomes.iter().flatten().all(|o| *o == 0 || *o == 1));
}

#[tokio::test]
async fn test_missing_file_names_path() {
    let dir = TempDir::new().unwrap();
    write_parquet(&dir.path().join("customer.parquet"), &customer_batch());
    let config = DashboardConfig::from_data_dir(dir.path());

    let err = Dataset::load(&config).await.unwrap_err();
    assert!(matches!(err, DashboardError::Load { .. }));
    assert!(err.to_string().contains("campaign.parquet"), "{err}");
}

#[tokio::test]
async fn test_missing_key_column() {
    let dir = TempDir::new().unwrap();
    write_parquet(&dir.path().join("customer.parquet"), &customer_batch());
    // Campaign file without customer_id
    let campaign = campaign_batch();
    let campaign = campaign.project(&[1, 2]).unwrap();
    write_parquet(&dir.path().join("campaign.parquet"), &campaign);

    let config = DashboardConfig::from_data_dir(dir.path());
    let err = Dataset::load(&config).await.unwrap_err();
    assert!(err.to_string().contains("customer_id"), "{err}");
}

#[tokio::test]
async fn test_age_and_job_filter() {
    let (_dir, config) = fixture_dir();
    let dataset = Dataset::load(&config).await.unwrap();

    let jobs: BTreeSet<String> = ["admin.", "services"].iter().map(|s| s.to_string()).collect();
    let filters = Filters::new(jobs.clone(), 25, 60).unwrap();
    let filtered = filters.apply(dataset.joined()).unwrap();

    let ids: Vec<i64> = int_column(&filtered, "customer_id")
        .into_iter()
        .map(Option::unwrap)
        .collect();
    assert!(!ids.is_empty());
    for id in &ids {
        let age = age_of(*id);
        assert!((25..=60).contains(&age), "customer {id} age {age}");
        assert!(jobs.contains(job_of(*id)));
    }

    // Nothing that satisfies both predicates is dropped
    let expected: Vec<i64> = int_column(dataset.joined().batches(), "customer_id")
        .into_iter()
        .map(Option::unwrap)
        .filter(|id| (25..=60).contains(&age_of(*id)) && jobs.contains(job_of(*id)))
        .collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_empty_job_selection() {
    let (_dir, config) = fixture_dir();
    let dataset = Dataset::load(&config).await.unwrap();

    let filters = Filters::new(BTreeSet::new(), 0, 200).unwrap();
    let filtered = filters.apply(dataset.joined()).unwrap();
    assert_eq!(filtered.iter().map(|b| b.num_rows()).sum::<usize>(), 0);

    let charts = Charts::compute(&dataset, &filters).unwrap();
    assert_eq!(charts.filtered_rows, 0);
    assert!(charts.age.is_empty());
    assert!(charts.render().contains("(no data)"));
}

#[tokio::test]
async fn test_charts_over_default_filters() {
    let (_dir, config) = fixture_dir();
    let dataset = Dataset::load(&config).await.unwrap();

    let filters = Filters::defaults(dataset.customer(), config.default_age_range).unwrap();
    assert_eq!(filters.age_range(), (25, 60));
    assert_eq!(filters.jobs(), &distinct_jobs(dataset.customer()).unwrap());

    let charts = Charts::compute(&dataset, &filters).unwrap();
    // Chart 1 covers all customers, not only the filtered ones
    let flagged: usize = charts.loan_or_housing.iter().map(|(_, n)| n).sum();
    assert_eq!(flagged, 12);

    // Joined ids 2, 3, 5, 7, 12 fall in 25..=60; 11 is 70
    assert_eq!(charts.filtered_rows, 5);
    // Customer 7 has no usable outcome and is left out of the histograms
    assert_eq!(charts.age.total(), 4);
    assert_eq!(charts.duration.total(), 4);

    let text = charts.render();
    assert!(text.contains("1. Customers with Loan or Housing"));
    assert!(text.contains("4. Job Distribution and Deposit Outcome"));
}
