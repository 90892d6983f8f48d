//! Algorithm implementations for cohort analysis
//!
//! This module contains the distribution distance used to compare cohorts,
//! concept hierarchy construction and traversal, and the summary statistics
//! computed over cohort membership.

pub mod distance;
pub mod hierarchy;
pub mod statistics;

pub use distance::{hellinger_distance, try_hellinger_distance};
pub use hierarchy::{
    ConceptHierarchy, HierarchyDirection, HierarchyRenderer, HierarchyWalk, RenderedNode,
    edges_from_record_batch, find_roots,
};
