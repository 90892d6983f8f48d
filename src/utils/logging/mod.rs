//! Logging utilities for user notification and progress tracking
//!
//! This module provides the notification channel used on cohort creation
//! paths, consistent operation logging, and progress bars.

pub mod log;
pub mod notify;
pub mod progress;

// Re-export commonly used functions for convenience
pub use self::log::{log_operation_complete, log_operation_start};
pub use notify::{ConsoleNotifier, Notifier};
pub use progress::{create_main_progress_bar, finish_progress_bar};
