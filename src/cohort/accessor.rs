//! Cached access to a single stored cohort
//!
//! Membership rows and the cohort definition are fetched from the store on
//! first use and kept for the accessor's lifetime. Statistics queries always go
//! to the store. Two accessors for the same cohort keep independent caches.

use std::sync::Arc;

use arrow::datatypes::{DataType, Field, FieldRef};
use arrow::record_batch::RecordBatch;
use log::debug;

use crate::error::{CohortError, Result};
use crate::models::{
    BasicStats, CohortDefinition, CohortMembership, ConceptStat, DistributionEntry, StatsVariable,
};
use crate::store::CohortStore;

/// Read-only view of one cohort in the cohort store
pub struct CohortAccessor<C: CohortStore + ?Sized> {
    cohort_id: i64,
    store: Arc<C>,
    cohort_data: Option<Vec<CohortMembership>>,
    metadata: Option<CohortDefinition>,
}

impl<C: CohortStore + ?Sized> CohortAccessor<C> {
    /// Bind an accessor to a cohort id; nothing is fetched yet
    #[must_use]
    pub fn new(cohort_id: i64, store: Arc<C>) -> Self {
        Self {
            cohort_id,
            store,
            cohort_data: None,
            metadata: None,
        }
    }

    #[must_use]
    pub fn cohort_id(&self) -> i64 {
        self.cohort_id
    }

    /// Membership rows of the cohort, fetched once
    pub fn data(&mut self) -> Result<&[CohortMembership]> {
        let rows = match self.cohort_data.take() {
            Some(rows) => rows,
            None => {
                let rows = self.store.get_cohort(self.cohort_id)?;
                debug!("Fetched {} rows for cohort {}", rows.len(), self.cohort_id);
                rows
            }
        };
        Ok(self.cohort_data.insert(rows).as_slice())
    }

    /// Definition of the cohort, fetched once
    pub fn metadata(&mut self) -> Result<&CohortDefinition> {
        let definition = match self.metadata.take() {
            Some(definition) => definition,
            None => self
                .store
                .get_cohort_definition(self.cohort_id)?
                .ok_or(CohortError::CohortNotFound(self.cohort_id))?,
        };
        Ok(self.metadata.insert(definition))
    }

    /// Aggregate statistics, for the whole cohort or one variable
    pub fn get_stats(&self, variable: StatsVariable) -> Result<BasicStats> {
        self.store.get_cohort_basic_stats(self.cohort_id, variable)
    }

    /// Probability distribution of a variable within the cohort
    pub fn get_distributions(&self, variable: StatsVariable) -> Result<Vec<DistributionEntry>> {
        self.store.get_cohort_distributions(self.cohort_id, variable)
    }

    /// Concept prevalence within the cohort
    pub fn get_concept_stats(&self) -> Result<Vec<ConceptStat>> {
        self.store.get_cohort_concept_stats(self.cohort_id)
    }

    /// Membership rows as an Arrow record batch
    ///
    /// Ids are Int64 and the membership dates Date32. An empty cohort yields a
    /// batch with the same schema and no rows.
    pub fn to_record_batch(&mut self) -> Result<RecordBatch> {
        let fields = membership_fields();
        let rows = self.data()?;
        Ok(serde_arrow::to_record_batch(&fields, &rows)?)
    }

    /// Whether the membership rows have been fetched
    #[must_use]
    pub fn is_data_cached(&self) -> bool {
        self.cohort_data.is_some()
    }

    /// Drop cached rows and metadata; the next access fetches again
    pub fn clear_cache(&mut self) {
        self.cohort_data = None;
        self.metadata = None;
    }
}

/// Arrow fields for [`CohortMembership`] rows
fn membership_fields() -> Vec<FieldRef> {
    vec![
        Field::new("subject_id", DataType::Int64, false),
        Field::new("cohort_definition_id", DataType::Int64, false),
        Field::new("cohort_start_date", DataType::Date32, false),
        Field::new("cohort_end_date", DataType::Date32, false),
    ]
    .into_iter()
    .map(Arc::new)
    .collect()
}

impl<C: CohortStore + ?Sized> Drop for CohortAccessor<C> {
    fn drop(&mut self) {
        self.clear_cache();
    }
}
