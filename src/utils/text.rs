//! Text normalisation helpers.

/// Collapse newlines, tabs and repeated whitespace into single spaces and trim
#[must_use]
pub fn clean_string(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
