//! A Rust library for deriving patient cohorts from a clinical data warehouse,
//! comparing their distributions, and summarising concept hierarchies.

pub mod algorithm;
pub mod cohort;
pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod store;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use config::{CohortConfig, DateFormatConfig, HierarchyConfig};
pub use error::{CohortError, Result};

// Cohorts
pub use cohort::{CohortAccessor, CohortManager, VariableDistance};
pub use models::{CohortDefinition, CohortMembership, StatsVariable};

// Stores
pub use store::{CohortStore, MemoryCohortStore, MemorySourceStore, SourceStore};

// Algorithms
pub use algorithm::{
    ConceptHierarchy, HierarchyDirection, HierarchyRenderer, find_roots, hellinger_distance,
    try_hellinger_distance,
};

// Utility functions
pub use loader::read_concept_edges;
