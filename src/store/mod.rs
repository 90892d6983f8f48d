//! Interfaces to the two databases the cohort pipeline works between
//!
//! The clinical source is read-only and answers arbitrary read queries. The
//! analytic cohort store persists cohort definitions and memberships and computes
//! aggregate statistics over them. Both are consumed through traits so that
//! real database bindings and the in-memory implementations in [`memory`] are
//! interchangeable.

pub mod memory;

pub use memory::{MemoryCohortStore, MemorySourceStore};

use crate::error::Result;
use crate::models::{
    BasicStats, CohortDefinition, CohortMembership, ConceptStat, DistributionEntry,
    NewCohortDefinition, Row, StatsVariable,
};

/// An open query session against the clinical source
pub trait SourceSession {
    /// Execute a read query and return its rows
    fn execute(&mut self, query: &str) -> Result<Vec<Row>>;

    /// Release the session; calling it more than once has no further effect
    fn close(&mut self);
}

/// The read-only clinical source database
pub trait SourceStore {
    /// Open a session for executing queries
    fn open_session(&self) -> Result<Box<dyn SourceSession + '_>>;
}

/// Closes the wrapped session when dropped
pub struct SessionGuard<'a> {
    session: Box<dyn SourceSession + 'a>,
}

impl<'a> SessionGuard<'a> {
    /// Open a session on `store` and guard it
    pub fn open<S: SourceStore + ?Sized>(store: &'a S) -> Result<Self> {
        Ok(Self {
            session: store.open_session()?,
        })
    }

    /// Execute a read query on the guarded session
    pub fn execute(&mut self, query: &str) -> Result<Vec<Row>> {
        self.session.execute(query)
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.session.close();
    }
}

/// The analytic store holding cohorts and their statistics
pub trait CohortStore {
    /// Insert a cohort definition and return its assigned id
    fn create_cohort_definition(&self, definition: NewCohortDefinition) -> Result<i64>;

    /// Insert one membership record
    fn create_cohort(&self, membership: &CohortMembership) -> Result<()>;

    /// Insert a batch of membership records
    ///
    /// The default inserts row by row, so a failure part way leaves the rows
    /// before it in place. Stores with transactions should override this.
    fn create_cohorts(&self, memberships: &[CohortMembership]) -> Result<()> {
        for membership in memberships {
            self.create_cohort(membership)?;
        }
        Ok(())
    }

    /// All membership rows of a cohort
    fn get_cohort(&self, cohort_definition_id: i64) -> Result<Vec<CohortMembership>>;

    /// The definition of a cohort, if it exists
    fn get_cohort_definition(&self, cohort_definition_id: i64)
    -> Result<Option<CohortDefinition>>;

    /// Aggregate statistics for a cohort, optionally restricted to one variable
    fn get_cohort_basic_stats(
        &self,
        cohort_definition_id: i64,
        variable: StatsVariable,
    ) -> Result<BasicStats>;

    /// Probability distribution of a variable within a cohort
    fn get_cohort_distributions(
        &self,
        cohort_definition_id: i64,
        variable: StatsVariable,
    ) -> Result<Vec<DistributionEntry>>;

    /// Concept prevalence within a cohort
    fn get_cohort_concept_stats(&self, cohort_definition_id: i64) -> Result<Vec<ConceptStat>>;

    /// Variables valid for distribution comparison, in comparison order
    fn distribution_variables(&self) -> Vec<StatsVariable>;
}
