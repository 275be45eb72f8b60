//! Notification sinks

use tracing::{info, warn};

/// Fire-and-forget user notifications
pub trait Notifier: Send + Sync {
    fn success(&self, text: &str);
    fn error(&self, text: &str);
}

/// Prints notifications to the terminal and mirrors them to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn success(&self, text: &str) {
        info!(notification = "success", "{}", text);
        println!("✓ {}", text);
    }

    fn error(&self, text: &str) {
        warn!(notification = "error", "{}", text);
        eprintln!("✗ {}", text);
    }
}
