//! Parsing of text dates returned by the clinical source.

use chrono::NaiveDate;

use crate::config::DateFormatConfig;

/// Parse a date with the configured formats
///
/// Timestamps are accepted by falling back to the part before the time
/// component (`2020-01-01 08:00:00`, `2020-01-01T08:00:00`).
#[must_use]
pub fn parse_date_string(s: &str, config: &DateFormatConfig) -> Option<NaiveDate> {
    let date_part = s.split_once([' ', 'T']).map(|(date, _)| date);

    std::iter::once(s).chain(date_part).find_map(|candidate| {
        config
            .date_formats
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(candidate, format).ok())
    })
}
