//! In-memory source and cohort stores
//!
//! These hold their data in process and are used by tests and by embedders
//! that stage data themselves. The cohort store computes the same statistics a
//! database-backed store would, over a person table and a concept occurrence
//! table supplied at construction.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use itertools::Itertools;
use log::{debug, warn};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::algorithm::statistics::{
    AGE_BINS, age_bin, category_counts, distribution_over, mean, median, sample_std_dev,
};
use crate::error::{CohortError, Result};
use crate::models::{
    AgeStats, BasicStats, CohortDefinition, CohortMembership, CohortOverview, ConceptOccurrence,
    ConceptStat, DistributionEntry, NewCohortDefinition, Person, Row, StatsVariable,
};
use crate::store::{CohortStore, SourceSession, SourceStore};
use crate::utils::clean_string;

/// Source store answering registered queries from memory
#[derive(Debug, Default)]
pub struct MemorySourceStore {
    results: FxHashMap<String, Vec<Row>>,
    failure: Option<String>,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

impl MemorySourceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every query fails with `message`
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Register the rows returned for a query
    ///
    /// Queries are matched after whitespace normalisation.
    #[must_use]
    pub fn with_result(mut self, query: &str, rows: Vec<Row>) -> Self {
        self.results.insert(clean_string(query), rows);
        self
    }

    /// Number of sessions opened so far
    #[must_use]
    pub fn opened_sessions(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Number of sessions closed so far
    #[must_use]
    pub fn closed_sessions(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl SourceStore for MemorySourceStore {
    fn open_session(&self) -> Result<Box<dyn SourceSession + '_>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySourceSession {
            store: self,
            closed: false,
        }))
    }
}

struct MemorySourceSession<'a> {
    store: &'a MemorySourceStore,
    closed: bool,
}

impl SourceSession for MemorySourceSession<'_> {
    fn execute(&mut self, query: &str) -> Result<Vec<Row>> {
        if self.closed {
            return Err(CohortError::SourceQuery("session is closed".to_string()));
        }
        if let Some(message) = &self.store.failure {
            return Err(CohortError::SourceQuery(message.clone()));
        }
        self.store
            .results
            .get(&clean_string(query))
            .cloned()
            .ok_or_else(|| {
                CohortError::SourceQuery(format!("no result registered for query: {query}"))
            })
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.store.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[derive(Debug, Default)]
struct CohortTables {
    definitions: Vec<CohortDefinition>,
    memberships: Vec<CohortMembership>,
    next_id: i64,
}

/// Cohort store keeping definitions and memberships in memory
#[derive(Debug)]
pub struct MemoryCohortStore {
    tables: RwLock<CohortTables>,
    persons: FxHashMap<i64, Person>,
    occurrences: Vec<ConceptOccurrence>,
    distribution_variables: Vec<StatsVariable>,
}

impl Default for MemoryCohortStore {
    fn default() -> Self {
        Self {
            tables: RwLock::new(CohortTables {
                next_id: 1,
                ..CohortTables::default()
            }),
            persons: FxHashMap::default(),
            occurrences: Vec::new(),
            distribution_variables: vec![StatsVariable::Age, StatsVariable::Gender],
        }
    }
}

impl MemoryCohortStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Demographics used by the statistics queries
    #[must_use]
    pub fn with_persons(mut self, persons: impl IntoIterator<Item = Person>) -> Self {
        self.persons
            .extend(persons.into_iter().map(|p| (p.person_id, p)));
        self
    }

    /// Concept occurrences used by the concept prevalence query
    #[must_use]
    pub fn with_concept_occurrences(
        mut self,
        occurrences: impl IntoIterator<Item = ConceptOccurrence>,
    ) -> Self {
        self.occurrences.extend(occurrences);
        self
    }

    /// Override the variables declared for distribution comparison
    #[must_use]
    pub fn with_distribution_variables(mut self, variables: Vec<StatsVariable>) -> Self {
        self.distribution_variables = variables;
        self
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, CohortTables>> {
        self.tables
            .read()
            .map_err(|e| CohortError::StoreRead(format!("cohort tables lock poisoned: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, CohortTables>> {
        self.tables
            .write()
            .map_err(|e| CohortError::StoreWrite(format!("cohort tables lock poisoned: {e}")))
    }

    fn members(&self, cohort_definition_id: i64) -> Result<Vec<CohortMembership>> {
        let tables = self.read()?;
        if !tables.definitions.iter().any(|d| d.id == cohort_definition_id) {
            return Err(CohortError::CohortNotFound(cohort_definition_id));
        }
        Ok(tables
            .memberships
            .iter()
            .filter(|m| m.cohort_definition_id == cohort_definition_id)
            .cloned()
            .collect())
    }

    /// Persons of the members, skipping subjects without demographics
    fn member_persons<'a>(
        &'a self,
        members: &'a [CohortMembership],
    ) -> impl Iterator<Item = (&'a CohortMembership, &'a Person)> + 'a {
        members.iter().filter_map(|m| {
            let person = self.persons.get(&m.subject_id);
            if person.is_none() {
                debug!("No demographics for subject {}", m.subject_id);
            }
            person.map(|p| (m, p))
        })
    }

    fn category_of(person: &Person, variable: StatsVariable) -> Option<&str> {
        match variable {
            StatsVariable::Gender => Some(person.gender.as_str()),
            StatsVariable::Race => Some(person.race.as_str()),
            StatsVariable::Ethnicity => Some(person.ethnicity.as_str()),
            StatsVariable::All | StatsVariable::Age => None,
        }
    }

    fn overview(members: &[CohortMembership]) -> CohortOverview {
        let durations: Vec<f64> = members.iter().map(|m| m.duration_days() as f64).collect();
        CohortOverview {
            total_count: members.len(),
            earliest_start_date: members.iter().map(|m| m.cohort_start_date).min(),
            latest_start_date: members.iter().map(|m| m.cohort_start_date).max(),
            earliest_end_date: members.iter().map(|m| m.cohort_end_date).min(),
            latest_end_date: members.iter().map(|m| m.cohort_end_date).max(),
            min_duration_days: members.iter().map(CohortMembership::duration_days).min(),
            max_duration_days: members.iter().map(CohortMembership::duration_days).max(),
            avg_duration_days: mean(&durations),
            median_duration_days: median(&durations),
            stddev_duration_days: sample_std_dev(&durations),
        }
    }

    fn age_stats(&self, members: &[CohortMembership]) -> AgeStats {
        let ages: Vec<i32> = self
            .member_persons(members)
            .map(|(m, p)| p.age_at(m.cohort_start_date))
            .collect();
        let values: Vec<f64> = ages.iter().map(|a| f64::from(*a)).collect();
        AgeStats {
            total_count: ages.len(),
            min_age: ages.iter().min().copied(),
            max_age: ages.iter().max().copied(),
            avg_age: mean(&values),
            median_age: median(&values),
            stddev_age: sample_std_dev(&values),
        }
    }
}

impl CohortStore for MemoryCohortStore {
    fn create_cohort_definition(&self, definition: NewCohortDefinition) -> Result<i64> {
        let mut tables = self.write()?;
        let id = tables.next_id;
        tables.next_id += 1;
        tables.definitions.push(definition.with_id(id));
        debug!("Stored cohort definition {id}");
        Ok(id)
    }

    fn create_cohort(&self, membership: &CohortMembership) -> Result<()> {
        let mut tables = self.write()?;
        if !tables
            .definitions
            .iter()
            .any(|d| d.id == membership.cohort_definition_id)
        {
            return Err(CohortError::StoreWrite(format!(
                "cohort definition {} does not exist",
                membership.cohort_definition_id
            )));
        }
        tables.memberships.push(membership.clone());
        Ok(())
    }

    /// Validates every row before inserting any, so the batch is all or nothing
    fn create_cohorts(&self, memberships: &[CohortMembership]) -> Result<()> {
        let mut tables = self.write()?;
        let known: FxHashSet<i64> = tables.definitions.iter().map(|d| d.id).collect();
        if let Some(orphan) = memberships
            .iter()
            .find(|m| !known.contains(&m.cohort_definition_id))
        {
            return Err(CohortError::StoreWrite(format!(
                "cohort definition {} does not exist",
                orphan.cohort_definition_id
            )));
        }
        tables.memberships.extend_from_slice(memberships);
        debug!("Stored {} cohort memberships", memberships.len());
        Ok(())
    }

    fn get_cohort(&self, cohort_definition_id: i64) -> Result<Vec<CohortMembership>> {
        let tables = self.read()?;
        Ok(tables
            .memberships
            .iter()
            .filter(|m| m.cohort_definition_id == cohort_definition_id)
            .cloned()
            .collect())
    }

    fn get_cohort_definition(
        &self,
        cohort_definition_id: i64,
    ) -> Result<Option<CohortDefinition>> {
        let tables = self.read()?;
        Ok(tables
            .definitions
            .iter()
            .find(|d| d.id == cohort_definition_id)
            .cloned())
    }

    fn get_cohort_basic_stats(
        &self,
        cohort_definition_id: i64,
        variable: StatsVariable,
    ) -> Result<BasicStats> {
        let members = self.members(cohort_definition_id)?;
        let stats = match variable {
            StatsVariable::All => BasicStats::Overview(Self::overview(&members)),
            StatsVariable::Age => BasicStats::Age(self.age_stats(&members)),
            StatsVariable::Gender | StatsVariable::Race | StatsVariable::Ethnicity => {
                BasicStats::Categories(category_counts(
                    self.member_persons(&members)
                        .filter_map(|(_, p)| Self::category_of(p, variable)),
                ))
            }
        };
        Ok(stats)
    }

    fn get_cohort_distributions(
        &self,
        cohort_definition_id: i64,
        variable: StatsVariable,
    ) -> Result<Vec<DistributionEntry>> {
        let members = self.members(cohort_definition_id)?;
        match variable {
            StatsVariable::All => Err(CohortError::UnsupportedVariable(
                "distributions need a variable".to_string(),
            )),
            StatsVariable::Age => Ok(distribution_over(
                AGE_BINS,
                self.member_persons(&members)
                    .map(|(m, p)| age_bin(p.age_at(m.cohort_start_date))),
            )),
            StatsVariable::Gender | StatsVariable::Race | StatsVariable::Ethnicity => {
                // Support is every category in the person table, so cohorts align
                let support: Vec<&str> = self
                    .persons
                    .values()
                    .filter_map(|p| Self::category_of(p, variable))
                    .unique()
                    .sorted()
                    .collect();
                Ok(distribution_over(
                    support,
                    self.member_persons(&members)
                        .filter_map(|(_, p)| Self::category_of(p, variable)),
                ))
            }
        }
    }

    fn get_cohort_concept_stats(&self, cohort_definition_id: i64) -> Result<Vec<ConceptStat>> {
        let members = self.members(cohort_definition_id)?;
        let member_count = members.iter().map(|m| m.subject_id).unique().count();
        if member_count == 0 {
            warn!("Cohort {cohort_definition_id} has no members; no concept statistics");
            return Ok(Vec::new());
        }

        let mut windows: FxHashMap<i64, Vec<&CohortMembership>> = FxHashMap::default();
        for membership in &members {
            windows.entry(membership.subject_id).or_default().push(membership);
        }

        let mut subjects_by_concept: FxHashMap<i64, (&str, FxHashSet<i64>)> =
            FxHashMap::default();
        for occurrence in &self.occurrences {
            let in_window = windows
                .get(&occurrence.person_id)
                .is_some_and(|ws| ws.iter().any(|m| m.covers(occurrence.occurrence_date)));
            if in_window {
                subjects_by_concept
                    .entry(occurrence.concept_id)
                    .or_insert_with(|| (occurrence.concept_name.as_str(), FxHashSet::default()))
                    .1
                    .insert(occurrence.person_id);
            }
        }

        Ok(subjects_by_concept
            .into_iter()
            .map(|(concept_id, (name, subjects))| ConceptStat {
                concept_id,
                concept_name: name.to_string(),
                count_in_cohort: subjects.len(),
                prevalence: subjects.len() as f64 / member_count as f64,
            })
            .sorted_by_key(|stat| stat.concept_id)
            .collect())
    }

    fn distribution_variables(&self) -> Vec<StatsVariable> {
        self.distribution_variables.clone()
    }
}
