//! Concept relationship models
//!
//! Edges describe direct parent → child relations in a clinical ontology. The
//! ancestor may be missing in raw tables; such rows never contribute a parent.

use serde::{Deserialize, Serialize};

/// Identifier of a concept in the ontology
pub type ConceptId = i64;

/// A direct (ancestor, descendant, details) relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptEdge {
    pub ancestor: Option<ConceptId>,
    pub descendant: Option<ConceptId>,
    /// Text rendered for the descendant
    pub details: String,
}

impl ConceptEdge {
    /// Edge with both endpoints present
    #[must_use]
    pub fn new(ancestor: ConceptId, descendant: ConceptId, details: impl Into<String>) -> Self {
        Self {
            ancestor: Some(ancestor),
            descendant: Some(descendant),
            details: details.into(),
        }
    }
}

/// A child entry in a built hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptChild {
    pub concept_id: Option<ConceptId>,
    pub details: String,
}

impl ConceptChild {
    #[must_use]
    pub fn new(concept_id: ConceptId, details: impl Into<String>) -> Self {
        Self {
            concept_id: Some(concept_id),
            details: details.into(),
        }
    }
}
