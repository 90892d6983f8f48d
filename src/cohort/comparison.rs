//! Per-variable distance between two cohorts.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::Result;
use crate::models::StatsVariable;

/// Hellinger distance between two cohorts' distributions of one variable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableDistance {
    pub variable: StatsVariable,
    pub distance: f64,
}

impl VariableDistance {
    /// Result key, e.g. `age_hellinger_distance`
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}_hellinger_distance", self.variable)
    }
}

/// Serialises as the single-entry map `{"<variable>_hellinger_distance": d}`
impl Serialize for VariableDistance {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.key(), &self.distance)?;
        map.end()
    }
}

/// Comparison results as a JSON array of single-entry objects
pub fn distances_to_json(results: &[VariableDistance]) -> Result<String> {
    Ok(serde_json::to_string(results)?)
}
