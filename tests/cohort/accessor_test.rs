//! Tests for cached cohort access and cohort statistics

use std::sync::Arc;

use arrow::array::AsArray;
use arrow::datatypes::{DataType, Date32Type, Int64Type};
use cohort_analyzer::models::BasicStats;
use cohort_analyzer::store::MemorySourceStore;
use cohort_analyzer::{CohortAccessor, CohortError, CohortManager, StatsVariable};

use crate::utils::*;

/// Creates the three-row cohort over the sample demographics
fn created_cohort() -> (Arc<CountingStore>, i64) {
    let store = Arc::new(CountingStore::new(populated_store()));
    let manager = CohortManager::new(Arc::new(three_row_source()), Arc::clone(&store))
        .with_notifier(Arc::new(RecordingNotifier::default()));
    let cohort_id = manager
        .create_cohort("diabetes", "Type 2 diabetes patients", COHORT_QUERY, "analyst")
        .unwrap()
        .cohort_id();
    (store, cohort_id)
}

#[test]
fn test_data_is_fetched_once() {
    let (store, cohort_id) = created_cohort();
    let mut accessor = CohortAccessor::new(cohort_id, Arc::clone(&store));
    assert!(!accessor.is_data_cached());

    let first = accessor.data().unwrap().to_vec();
    let second = accessor.data().unwrap().to_vec();

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    assert!(accessor.is_data_cached());
    assert_eq!(CountingStore::count(&store.cohort_reads), 1);
}

#[test]
fn test_metadata_is_fetched_once() {
    let (store, cohort_id) = created_cohort();
    let mut accessor = CohortAccessor::new(cohort_id, Arc::clone(&store));

    assert_eq!(accessor.metadata().unwrap().name, "diabetes");
    assert_eq!(accessor.metadata().unwrap().creation_info, COHORT_QUERY);
    assert_eq!(CountingStore::count(&store.definition_reads), 1);
}

#[test]
fn test_clear_cache_refetches() {
    let (store, cohort_id) = created_cohort();
    let mut accessor = CohortAccessor::new(cohort_id, Arc::clone(&store));

    accessor.data().unwrap();
    accessor.clear_cache();
    assert!(!accessor.is_data_cached());
    accessor.data().unwrap();

    assert_eq!(CountingStore::count(&store.cohort_reads), 2);
}

#[test]
fn test_accessors_keep_separate_caches() {
    let (store, cohort_id) = created_cohort();
    let mut first = CohortAccessor::new(cohort_id, Arc::clone(&store));
    let mut second = CohortAccessor::new(cohort_id, Arc::clone(&store));

    first.data().unwrap();
    first.data().unwrap();
    second.data().unwrap();

    assert_eq!(CountingStore::count(&store.cohort_reads), 2);
}

#[test]
fn test_unknown_cohort() {
    let (store, _) = created_cohort();
    let mut accessor = CohortAccessor::new(42, Arc::clone(&store));

    assert!(matches!(accessor.metadata(), Err(CohortError::CohortNotFound(42))));
    // Membership reads do not check the definition table
    assert!(accessor.data().unwrap().is_empty());
}

#[test]
fn test_overview_stats() {
    let (store, cohort_id) = created_cohort();
    let accessor = CohortAccessor::new(cohort_id, store);

    let BasicStats::Overview(overview) = accessor.get_stats(StatsVariable::All).unwrap() else {
        panic!("expected a cohort overview");
    };
    assert_eq!(overview.total_count, 3);
    assert_eq!(overview.earliest_start_date, Some(date(2020, 1, 1)));
    assert_eq!(overview.latest_end_date, Some(date(2021, 9, 15)));
    assert_eq!(overview.min_duration_days, Some(92));
    assert_eq!(overview.max_duration_days, Some(365));
}

#[test]
fn test_age_stats() {
    let (store, cohort_id) = created_cohort();
    let accessor = CohortAccessor::new(cohort_id, store);

    let BasicStats::Age(age) = accessor.get_stats(StatsVariable::Age).unwrap() else {
        panic!("expected age statistics");
    };
    assert_eq!(age.total_count, 3);
    assert_eq!(age.min_age, Some(16));
    assert_eq!(age.max_age, Some(70));
    assert_eq!(age.median_age, Some(35.0));
}

#[test]
fn test_gender_stats() {
    let (store, cohort_id) = created_cohort();
    let accessor = CohortAccessor::new(cohort_id, store);

    let BasicStats::Categories(counts) = accessor.get_stats(StatsVariable::Gender).unwrap() else {
        panic!("expected category counts");
    };
    let summary: Vec<(&str, usize)> = counts
        .iter()
        .map(|c| (c.category.as_str(), c.count))
        .collect();
    assert_eq!(summary, vec![("F", 2), ("M", 1)]);
    assert!((counts[0].probability - 2.0 / 3.0).abs() < 1e-12);
}

#[test]
fn test_age_distribution() {
    let (store, cohort_id) = created_cohort();
    let accessor = CohortAccessor::new(cohort_id, store);

    let distribution = accessor.get_distributions(StatsVariable::Age).unwrap();
    let total: f64 = distribution.iter().map(|e| e.probability).sum();
    assert!((total - 1.0).abs() < 1e-12);

    let occupied: Vec<&str> = distribution
        .iter()
        .filter(|e| e.count > 0)
        .map(|e| e.category.as_str())
        .collect();
    assert_eq!(occupied, vec!["11-20", "31-40", "61-70"]);
}

#[test]
fn test_distribution_needs_a_variable() {
    let (store, cohort_id) = created_cohort();
    let accessor = CohortAccessor::new(cohort_id, store);

    assert!(matches!(
        accessor.get_distributions(StatsVariable::All),
        Err(CohortError::UnsupportedVariable(_))
    ));
}

#[test]
fn test_concept_stats() {
    let (store, cohort_id) = created_cohort();
    let accessor = CohortAccessor::new(cohort_id, store);

    let stats = accessor.get_concept_stats().unwrap();
    assert_eq!(stats.len(), 2);

    assert_eq!(stats[0].concept_id, 201826);
    assert_eq!(stats[0].concept_name, "Type 2 diabetes mellitus");
    assert_eq!(stats[0].count_in_cohort, 2);
    assert!((stats[0].prevalence - 2.0 / 3.0).abs() < 1e-12);

    // Subject 2's occurrence falls after their cohort window
    assert_eq!(stats[1].concept_id, 316866);
    assert_eq!(stats[1].count_in_cohort, 1);
    assert!((stats[1].prevalence - 1.0 / 3.0).abs() < 1e-12);
}

#[test]
fn test_to_record_batch() {
    let (store, cohort_id) = created_cohort();
    let mut accessor = CohortAccessor::new(cohort_id, store);

    let batch = accessor.to_record_batch().unwrap();
    assert_eq!(batch.num_rows(), 3);
    assert_eq!(batch.num_columns(), 4);

    let schema = batch.schema();
    assert_eq!(schema.field(0).name(), "subject_id");
    assert_eq!(schema.field(0).data_type(), &DataType::Int64);
    assert_eq!(schema.field(2).name(), "cohort_start_date");
    assert_eq!(schema.field(2).data_type(), &DataType::Date32);

    let subjects = batch.column(0).as_primitive::<Int64Type>();
    let cohort_ids = batch.column(1).as_primitive::<Int64Type>();
    let starts = batch.column(2).as_primitive::<Date32Type>();
    let ends = batch.column(3).as_primitive::<Date32Type>();
    assert_eq!(subjects.values().to_vec(), vec![1, 2, 3]);
    assert!(cohort_ids.values().iter().all(|id| *id == cohort_id));
    assert_eq!(starts.value_as_date(1), Some(date(2020, 3, 1)));
    assert_eq!(ends.value_as_date(1), Some(date(2021, 2, 28)));
    assert_eq!(ends.value_as_date(2), Some(date(2021, 9, 15)));
}

#[test]
fn test_empty_cohort_to_record_batch() {
    let source = MemorySourceStore::new().with_result(COHORT_QUERY, Vec::new());
    let manager = CohortManager::new(Arc::new(source), Arc::new(populated_store()))
        .with_notifier(Arc::new(RecordingNotifier::default()));
    let mut accessor = manager.create_cohort("empty", "", COHORT_QUERY, "analyst").unwrap();

    let batch = accessor.to_record_batch().unwrap();
    assert_eq!(batch.num_rows(), 0);
    assert_eq!(batch.num_columns(), 4);
    assert_eq!(batch.schema().field(3).data_type(), &DataType::Date32);
}

#[test]
fn test_manager_cohort_accessor() {
    let (store, cohort_id) = created_cohort();
    let manager = CohortManager::new(Arc::new(MemorySourceStore::new()), store);

    let mut accessor = manager.cohort(cohort_id);
    assert_eq!(accessor.data().unwrap().len(), 3);
}
