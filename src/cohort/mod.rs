//! Cohort creation, access and comparison
//!
//! [`CohortManager`] turns a source query into a persisted cohort and compares
//! stored cohorts. [`CohortAccessor`] exposes one cohort's rows, metadata and
//! statistics, caching what it has already fetched.

pub mod accessor;
pub mod comparison;
pub mod manager;

pub use accessor::CohortAccessor;
pub use comparison::{VariableDistance, distances_to_json};
pub use manager::CohortManager;
