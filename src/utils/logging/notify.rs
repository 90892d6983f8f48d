//! User notification channel
//!
//! Messages meant for the person driving the analysis are shown to them and
//! written to the log at the same time.

use log::Level;

/// Sink for user-facing messages
pub trait Notifier {
    /// Show a message to the user and log it at `level`
    fn notify(&self, message: &str, level: Level);

    fn info(&self, message: &str) {
        self.notify(message, Level::Info);
    }

    fn warning(&self, message: &str) {
        self.notify(message, Level::Warn);
    }

    fn error(&self, message: &str) {
        self.notify(message, Level::Error);
    }
}

/// Prints to stdout and forwards to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, level: Level) {
        println!("{message}");
        log::log!(level, "{message}");
    }
}
