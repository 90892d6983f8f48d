//! Domain models for cohorts, source rows, statistics and concept relationships.

pub mod cohort;
pub mod concept;
pub mod person;
pub mod stats;
pub mod value;

pub use cohort::{CohortDefinition, CohortMembership, NewCohortDefinition};
pub use concept::{ConceptChild, ConceptEdge, ConceptId};
pub use person::{ConceptOccurrence, Person};
pub use stats::{
    AgeStats, BasicStats, CategoryCount, CohortOverview, ConceptStat, DistributionEntry,
    StatsVariable,
};
pub use value::{Row, Value};
