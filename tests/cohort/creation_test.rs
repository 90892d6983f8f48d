//! Tests for cohort creation from source queries

use std::sync::Arc;

use chrono::Local;
use cohort_analyzer::models::Value;
use cohort_analyzer::store::{CohortStore, MemoryCohortStore, MemorySourceStore};
use cohort_analyzer::{CohortError, CohortManager};
use log::Level;

use crate::utils::*;

fn manager(
    source: MemorySourceStore,
    store: CountingStore,
) -> (
    CohortManager<MemorySourceStore, CountingStore>,
    Arc<MemorySourceStore>,
    Arc<RecordingNotifier>,
) {
    let source = Arc::new(source);
    let notifier = Arc::new(RecordingNotifier::default());
    let manager = CohortManager::new(Arc::clone(&source), Arc::new(store))
        .with_notifier(notifier.clone());
    (manager, source, notifier)
}

#[test]
fn test_create_cohort_stores_every_row() {
    let (manager, source, notifier) = manager(three_row_source(), CountingStore::default());

    let mut accessor = manager
        .create_cohort("diabetes", "Type 2 diabetes patients", COHORT_QUERY, "analyst")
        .unwrap();

    let store = manager.store();
    assert_eq!(CountingStore::count(&store.definition_inserts), 1);
    assert_eq!(CountingStore::count(&store.membership_inserts), 3);

    let cohort_id = accessor.cohort_id();
    let rows = accessor.data().unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|m| m.cohort_definition_id == cohort_id));
    assert_eq!(
        rows.iter().map(|m| m.subject_id).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(rows[1].cohort_start_date, date(2020, 3, 1));
    assert_eq!(rows[1].cohort_end_date, date(2021, 2, 28));

    let metadata = accessor.metadata().unwrap();
    assert_eq!(metadata.id, cohort_id);
    assert_eq!(metadata.name, "diabetes");
    assert_eq!(metadata.description, "Type 2 diabetes patients");
    assert_eq!(metadata.creation_info, COHORT_QUERY);
    assert_eq!(metadata.created_by, "analyst");
    assert_eq!(metadata.created_date, Local::now().date_naive());

    assert_eq!(
        notifier.messages(),
        vec![(Level::Info, "Cohort diabetes successfully created.".to_string())]
    );
    assert_eq!(source.opened_sessions(), 1);
    assert_eq!(source.closed_sessions(), 1);
}

#[test]
fn test_cohort_ids_are_distinct() {
    let source = three_row_source();
    let (manager, _, _) = manager(source, CountingStore::default());

    let first = manager.create_cohort("a", "", COHORT_QUERY, "analyst").unwrap();
    let second = manager.create_cohort("b", "", COHORT_QUERY, "analyst").unwrap();

    assert_ne!(first.cohort_id(), second.cohort_id());
    assert_eq!(manager.store().get_cohort(first.cohort_id()).unwrap().len(), 3);
    assert_eq!(manager.store().get_cohort(second.cohort_id()).unwrap().len(), 3);
}

#[test]
fn test_empty_result_creates_empty_cohort() {
    let source = MemorySourceStore::new().with_result(COHORT_QUERY, Vec::new());
    let (manager, _, notifier) = manager(source, CountingStore::default());

    let mut accessor = manager.create_cohort("empty", "", COHORT_QUERY, "analyst").unwrap();

    assert!(accessor.data().unwrap().is_empty());
    assert_eq!(CountingStore::count(&manager.store().definition_inserts), 1);
    assert_eq!(notifier.messages()[0].0, Level::Info);
}

#[test]
fn test_source_failure_writes_nothing() {
    let source = MemorySourceStore::failing("relation \"diabetes_cohort\" does not exist");
    let (manager, source, notifier) = manager(source, CountingStore::default());

    let err = manager
        .create_cohort("diabetes", "", COHORT_QUERY, "analyst")
        .err()
        .unwrap();

    assert!(matches!(err, CohortError::SourceQuery(_)));
    let store = manager.store();
    assert_eq!(CountingStore::count(&store.definition_inserts), 0);
    assert_eq!(CountingStore::count(&store.membership_inserts), 0);

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, Level::Error);
    assert!(messages[0].1.starts_with("Error executing query: "));
    assert!(messages[0].1.contains("does not exist"));

    // The session is released even though the query failed
    assert_eq!(source.opened_sessions(), 1);
    assert_eq!(source.closed_sessions(), 1);
}

#[test]
fn test_missing_column_writes_nothing() {
    let mut rows = three_rows();
    rows[2].remove("cohort_end_date");
    let source = MemorySourceStore::new().with_result(COHORT_QUERY, rows);
    let (manager, source, notifier) = manager(source, CountingStore::default());

    let err = manager
        .create_cohort("diabetes", "", COHORT_QUERY, "analyst")
        .err()
        .unwrap();

    assert!(matches!(
        err,
        CohortError::MissingColumn { ref column, row: 2 } if column == "cohort_end_date"
    ));
    assert_eq!(CountingStore::count(&manager.store().definition_inserts), 0);
    assert_eq!(notifier.messages()[0].0, Level::Error);
    assert_eq!(source.opened_sessions(), 1);
    assert_eq!(source.closed_sessions(), 1);
}

#[test]
fn test_insert_failure_keeps_earlier_rows() {
    let store = CountingStore::failing_after(MemoryCohortStore::new(), 2);
    let (manager, source, notifier) = manager(three_row_source(), store);

    let err = manager
        .create_cohort("diabetes", "", COHORT_QUERY, "analyst")
        .err()
        .unwrap();

    assert!(matches!(err, CohortError::StoreWrite(_)));
    assert_eq!(
        notifier.messages(),
        vec![(
            Level::Error,
            "Error executing query: Store write error: disk full".to_string()
        )]
    );

    // Row-by-row inserts are not rolled back
    let store = manager.store();
    assert_eq!(CountingStore::count(&store.definition_inserts), 1);
    assert_eq!(store.inner.get_cohort(1).unwrap().len(), 2);
    assert_eq!(source.opened_sessions(), 1);
    assert_eq!(source.closed_sessions(), 1);
}

#[test]
fn test_batch_insert_is_atomic_in_memory_store() {
    let store = MemoryCohortStore::new();
    let memberships = vec![
        cohort_analyzer::CohortMembership::new(1, 1, date(2020, 1, 1), date(2020, 2, 1)),
        cohort_analyzer::CohortMembership::new(2, 99, date(2020, 1, 1), date(2020, 2, 1)),
    ];
    let definition = cohort_analyzer::models::NewCohortDefinition {
        name: "a".to_string(),
        description: String::new(),
        created_date: date(2024, 1, 1),
        creation_info: COHORT_QUERY.to_string(),
        created_by: "analyst".to_string(),
    };
    assert_eq!(store.create_cohort_definition(definition).unwrap(), 1);

    let err = store.create_cohorts(&memberships).unwrap_err();
    assert!(matches!(err, CohortError::StoreWrite(ref m) if m.contains("99")));
    assert!(store.get_cohort(1).unwrap().is_empty());
}

#[test]
fn test_source_values_are_coerced() {
    let rows = vec![
        source_row(7.0_f64, "2020-01-01", "2020-06-30"),
        source_row("8", "2020-02-01 00:00:00", date(2020, 7, 31)),
        source_row(9_i64, "2020-03-01T08:30:00", "20200831"),
    ];
    let source = MemorySourceStore::new().with_result(COHORT_QUERY, rows);
    let (manager, _, _) = manager(source, CountingStore::default());

    let mut accessor = manager.create_cohort("coerced", "", COHORT_QUERY, "analyst").unwrap();
    let rows = accessor.data().unwrap();

    assert_eq!(
        rows.iter().map(|m| m.subject_id).collect::<Vec<_>>(),
        vec![7, 8, 9]
    );
    assert_eq!(rows[1].cohort_start_date, date(2020, 2, 1));
    assert_eq!(rows[2].cohort_start_date, date(2020, 3, 1));
    assert_eq!(rows[2].cohort_end_date, date(2020, 8, 31));
}

#[test]
fn test_invalid_value_is_reported() {
    let rows = vec![source_row(Value::Null, date(2020, 1, 1), date(2020, 2, 1))];
    let source = MemorySourceStore::new().with_result(COHORT_QUERY, rows);
    let (manager, _, _) = manager(source, CountingStore::default());

    let err = manager
        .create_cohort("nulls", "", COHORT_QUERY, "analyst")
        .err()
        .unwrap();

    assert!(matches!(err, CohortError::InvalidValue { ref column, .. } if column == "person_id"));
    assert_eq!(CountingStore::count(&manager.store().definition_inserts), 0);
}
