//! Cohort definition and membership models
//!
//! A cohort is a named set of subjects derived from a read query against the
//! clinical source. The definition records provenance; one membership row exists
//! per subject and points back at its definition.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Provenance record of a persisted cohort
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortDefinition {
    /// Identifier assigned by the cohort store
    pub id: i64,
    /// Human readable name
    pub name: String,
    /// Free-text description
    pub description: String,
    /// Date the cohort was created
    pub created_date: NaiveDate,
    /// Query text the cohort was derived from
    pub creation_info: String,
    /// Identity of the creator
    pub created_by: String,
}

/// A cohort definition that has not been inserted yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCohortDefinition {
    pub name: String,
    pub description: String,
    pub created_date: NaiveDate,
    pub creation_info: String,
    pub created_by: String,
}

impl NewCohortDefinition {
    /// Attach the store-assigned identifier
    #[must_use]
    pub fn with_id(self, id: i64) -> CohortDefinition {
        CohortDefinition {
            id,
            name: self.name,
            description: self.description,
            created_date: self.created_date,
            creation_info: self.creation_info,
            created_by: self.created_by,
        }
    }
}

/// One subject's membership in a cohort
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortMembership {
    /// Subject (person) identifier
    pub subject_id: i64,
    /// Owning cohort definition
    pub cohort_definition_id: i64,
    /// First day of membership
    pub cohort_start_date: NaiveDate,
    /// Last day of membership
    pub cohort_end_date: NaiveDate,
}

impl CohortMembership {
    /// Create a new membership record
    #[must_use]
    pub fn new(
        subject_id: i64,
        cohort_definition_id: i64,
        cohort_start_date: NaiveDate,
        cohort_end_date: NaiveDate,
    ) -> Self {
        Self {
            subject_id,
            cohort_definition_id,
            cohort_start_date,
            cohort_end_date,
        }
    }

    /// Number of days between start and end of membership
    #[must_use]
    pub fn duration_days(&self) -> i64 {
        (self.cohort_end_date - self.cohort_start_date).num_days()
    }

    /// Whether a date falls inside the membership window (inclusive)
    #[must_use]
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.cohort_start_date <= date && date <= self.cohort_end_date
    }
}
