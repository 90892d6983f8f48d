//! Utility functions shared across the crate
//!
//! Date parsing, text normalisation, user notification and progress reporting.

pub mod date_utils;
pub mod logging;
pub mod text;

pub use date_utils::parse_date_string;
pub use logging::{ConsoleNotifier, Notifier};
pub use text::clean_string;
