//! Cohort creation and comparison
//!
//! Creation runs a read query against the clinical source, stores a cohort
//! definition that records the query, and stores one membership row per result
//! row. Comparison computes a Hellinger distance per distribution variable the
//! cohort store declares.

use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDate};
use indicatif::ProgressBar;
use log::{debug, info};

use crate::algorithm::distance::try_hellinger_distance;
use crate::cohort::{CohortAccessor, VariableDistance, distances_to_json};
use crate::config::CohortConfig;
use crate::error::{CohortError, Result};
use crate::models::{CohortMembership, NewCohortDefinition, Row, StatsVariable, Value};
use crate::store::{CohortStore, SessionGuard, SourceStore};
use crate::utils::clean_string;
use crate::utils::logging::{
    ConsoleNotifier, Notifier, create_main_progress_bar, finish_progress_bar,
    log_operation_complete, log_operation_start,
};

/// Subject and dates read from one source row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MemberDates {
    subject_id: i64,
    start: NaiveDate,
    end: NaiveDate,
}

/// Creates cohorts from source queries and compares stored cohorts
pub struct CohortManager<S: SourceStore + ?Sized, C: CohortStore + ?Sized> {
    source: Arc<S>,
    store: Arc<C>,
    config: CohortConfig,
    notifier: Arc<dyn Notifier>,
}

impl<S: SourceStore + ?Sized, C: CohortStore + ?Sized> CohortManager<S, C> {
    /// Create a manager with the default configuration and console notifications
    #[must_use]
    pub fn new(source: Arc<S>, store: Arc<C>) -> Self {
        Self {
            source,
            store,
            config: CohortConfig::default(),
            notifier: Arc::new(ConsoleNotifier),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: CohortConfig) -> Self {
        self.config = config;
        self
    }

    /// Route user-facing messages to `notifier`
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    #[must_use]
    pub fn config(&self) -> &CohortConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<C> {
        &self.store
    }

    /// Accessor for an already stored cohort
    #[must_use]
    pub fn cohort(&self, cohort_id: i64) -> CohortAccessor<C> {
        CohortAccessor::new(cohort_id, Arc::clone(&self.store))
    }

    /// Create a cohort from the rows `query` returns
    ///
    /// Every row must provide the subject id and the two membership dates. On
    /// success the user is notified and an accessor for the new cohort is
    /// returned. On failure the user is notified and the error is returned;
    /// membership rows already written by a store without transactional batch
    /// inserts are not removed.
    pub fn create_cohort(
        &self,
        name: &str,
        description: &str,
        query: &str,
        created_by: &str,
    ) -> Result<CohortAccessor<C>> {
        log_operation_start("Creating cohort", name);
        match self.try_create_cohort(name, description, query, created_by) {
            Ok(accessor) => {
                self.notifier
                    .info(&format!("Cohort {name} successfully created."));
                Ok(accessor)
            }
            Err(e) => {
                self.notifier.error(&format!("Error executing query: {e}"));
                Err(e)
            }
        }
    }

    fn try_create_cohort(
        &self,
        name: &str,
        description: &str,
        query: &str,
        created_by: &str,
    ) -> Result<CohortAccessor<C>> {
        let start = Instant::now();
        debug!("Cohort query: {}", clean_string(query));

        // The session is released when the guard leaves this block, on every path
        let rows = {
            let mut session = SessionGuard::open(self.source.as_ref())?;
            session.execute(query)?
        };
        let members = self.read_members(&rows)?;

        let cohort_id = self.store.create_cohort_definition(NewCohortDefinition {
            name: name.to_string(),
            description: description.to_string(),
            created_date: Local::now().date_naive(),
            creation_info: query.to_string(),
            created_by: created_by.to_string(),
        })?;

        let memberships: Vec<CohortMembership> = members
            .into_iter()
            .map(|m| CohortMembership::new(m.subject_id, cohort_id, m.start, m.end))
            .collect();
        self.store.create_cohorts(&memberships)?;

        log_operation_complete("stored", name, memberships.len(), Some(start.elapsed()));
        Ok(CohortAccessor::new(cohort_id, Arc::clone(&self.store)))
    }

    fn read_members(&self, rows: &[Row]) -> Result<Vec<MemberDates>> {
        let pb = if self.config.show_progress {
            create_main_progress_bar(rows.len() as u64, Some("Reading cohort rows"))
        } else {
            ProgressBar::hidden()
        };

        let members = rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let member = self.read_member(index, row);
                pb.inc(1);
                member
            })
            .collect::<Result<Vec<_>>>();

        finish_progress_bar(&pb, "Cohort rows read");
        members
    }

    fn read_member(&self, index: usize, row: &Row) -> Result<MemberDates> {
        let config = &self.config;
        let subject_id = column(row, &config.person_id_column, index)?
            .to_i64(&config.person_id_column)?;
        let start = column(row, &config.start_date_column, index)?
            .to_date(&config.start_date_column, &config.date_format_config)?;
        let end = column(row, &config.end_date_column, index)?
            .to_date(&config.end_date_column, &config.date_format_config)?;

        Ok(MemberDates {
            subject_id,
            start,
            end,
        })
    }

    /// Distance between two cohorts for each declared distribution variable
    ///
    /// Probabilities are compared in the order the store returns them; the
    /// categories of the two cohorts are not matched up by label.
    pub fn compare_cohorts(
        &self,
        cohort_id_1: i64,
        cohort_id_2: i64,
    ) -> Result<Vec<VariableDistance>> {
        self.store
            .distribution_variables()
            .into_iter()
            .map(|variable| {
                let p = self.probabilities(cohort_id_1, variable)?;
                let q = self.probabilities(cohort_id_2, variable)?;
                let distance = try_hellinger_distance(&p, &q)?;
                info!(
                    "Cohorts {cohort_id_1} and {cohort_id_2}: {variable} Hellinger distance {distance:.4}"
                );
                Ok(VariableDistance { variable, distance })
            })
            .collect()
    }

    /// [`compare_cohorts`](Self::compare_cohorts) rendered as JSON, e.g.
    /// `[{"age_hellinger_distance":0.12},{"gender_hellinger_distance":0.0}]`
    pub fn compare_cohorts_json(&self, cohort_id_1: i64, cohort_id_2: i64) -> Result<String> {
        distances_to_json(&self.compare_cohorts(cohort_id_1, cohort_id_2)?)
    }

    fn probabilities(&self, cohort_id: i64, variable: StatsVariable) -> Result<Vec<f64>> {
        Ok(self
            .store
            .get_cohort_distributions(cohort_id, variable)?
            .into_iter()
            .map(|entry| entry.probability)
            .collect())
    }
}

fn column<'a>(row: &'a Row, name: &str, index: usize) -> Result<&'a Value> {
    row.get(name).ok_or_else(|| CohortError::MissingColumn {
        column: name.to_string(),
        row: index,
    })
}
