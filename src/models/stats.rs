//! Aggregate statistics returned by the cohort store.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CohortError;
use crate::models::ConceptId;

/// Variables accepted by the statistics queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsVariable {
    /// Whole-cohort summary, requested with an empty variable name
    All,
    Age,
    Gender,
    Race,
    Ethnicity,
}

impl StatsVariable {
    /// Name used in queries and result keys
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "",
            Self::Age => "age",
            Self::Gender => "gender",
            Self::Race => "race",
            Self::Ethnicity => "ethnicity",
        }
    }
}

impl FromStr for StatsVariable {
    type Err = CohortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" => Ok(Self::All),
            "age" => Ok(Self::Age),
            "gender" => Ok(Self::Gender),
            "race" => Ok(Self::Race),
            "ethnicity" => Ok(Self::Ethnicity),
            _ => Err(CohortError::UnsupportedVariable(s.to_string())),
        }
    }
}

impl fmt::Display for StatsVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of membership dates and durations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortOverview {
    pub total_count: usize,
    pub earliest_start_date: Option<NaiveDate>,
    pub latest_start_date: Option<NaiveDate>,
    pub earliest_end_date: Option<NaiveDate>,
    pub latest_end_date: Option<NaiveDate>,
    pub min_duration_days: Option<i64>,
    pub max_duration_days: Option<i64>,
    pub avg_duration_days: Option<f64>,
    pub median_duration_days: Option<f64>,
    pub stddev_duration_days: Option<f64>,
}

/// Age summary at cohort start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeStats {
    pub total_count: usize,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    pub avg_age: Option<f64>,
    pub median_age: Option<f64>,
    pub stddev_age: Option<f64>,
}

/// Count of members in one category of a categorical variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
    pub probability: f64,
}

/// Result of a basic statistics query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BasicStats {
    Overview(CohortOverview),
    Age(AgeStats),
    Categories(Vec<CategoryCount>),
}

/// One row of a probability distribution table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionEntry {
    pub category: String,
    pub count: usize,
    pub probability: f64,
}

/// Prevalence of a concept among cohort members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptStat {
    pub concept_id: ConceptId,
    pub concept_name: String,
    pub count_in_cohort: usize,
    pub prevalence: f64,
}
