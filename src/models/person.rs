//! Subject demographics and concept occurrences held by the analytic store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::ConceptId;

/// Demographic attributes of a subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub person_id: i64,
    pub year_of_birth: i32,
    pub gender: String,
    pub race: String,
    pub ethnicity: String,
}

impl Person {
    #[must_use]
    pub fn new(
        person_id: i64,
        year_of_birth: i32,
        gender: impl Into<String>,
        race: impl Into<String>,
        ethnicity: impl Into<String>,
    ) -> Self {
        Self {
            person_id,
            year_of_birth,
            gender: gender.into(),
            race: race.into(),
            ethnicity: ethnicity.into(),
        }
    }

    /// Age in whole years at a date, counted by calendar year
    #[must_use]
    pub fn age_at(&self, date: NaiveDate) -> i32 {
        use chrono::Datelike;
        date.year() - self.year_of_birth
    }
}

/// A recorded clinical concept (condition, drug, ...) for a subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptOccurrence {
    pub person_id: i64,
    pub concept_id: ConceptId,
    pub concept_name: String,
    pub occurrence_date: NaiveDate,
}
