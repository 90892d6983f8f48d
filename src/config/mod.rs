//! Configuration for cohort creation and concept hierarchy handling.

/// Date formats accepted for text date columns
#[derive(Debug, Clone)]
pub struct DateFormatConfig {
    /// chrono formats tried in order, on the full value and then on the part
    /// before a time component
    pub date_formats: Vec<String>,
}

impl Default for DateFormatConfig {
    fn default() -> Self {
        Self {
            date_formats: vec![
                "%Y-%m-%d".to_string(), // ISO: 2023-01-15
                "%Y%m%d".to_string(),   // Compact: 20230115
            ],
        }
    }
}

/// Configuration for turning source query results into cohort records
#[derive(Debug, Clone)]
pub struct CohortConfig {
    /// Column holding the subject identifier
    pub person_id_column: String,
    /// Column holding the membership start date
    pub start_date_column: String,
    /// Column holding the membership end date
    pub end_date_column: String,
    /// Formats used when a date arrives as text
    pub date_format_config: DateFormatConfig,
    /// Draw a progress bar while converting source rows
    pub show_progress: bool,
}

impl Default for CohortConfig {
    fn default() -> Self {
        Self {
            person_id_column: "person_id".to_string(),
            start_date_column: "cohort_start_date".to_string(),
            end_date_column: "cohort_end_date".to_string(),
            date_format_config: DateFormatConfig::default(),
            show_progress: false,
        }
    }
}

/// Configuration for concept hierarchy tables and rendering
#[derive(Debug, Clone)]
pub struct HierarchyConfig {
    /// Column with the parent concept id
    pub ancestor_column: String,
    /// Column with the child concept id
    pub descendant_column: String,
    /// Column with the text rendered for the child
    pub details_column: String,
    /// Indent unit repeated once per depth level
    pub indent: String,
    /// Reject cyclic edge sets when building
    pub check_cycles: bool,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            ancestor_column: "ancestor_concept_id".to_string(),
            descendant_column: "descendant_concept_id".to_string(),
            details_column: "details".to_string(),
            indent: "  ".to_string(),
            check_cycles: true,
        }
    }
}
