//! Session-invalidation redirect.

use parking_lot::Mutex;
use tracing::warn;

/// Moves the user to another location (the login page on 401).
pub trait Navigator: Send + Sync {
    fn redirect(&self, path: &str);
}

/// Logs the absolute login URL. Used by headless callers such as the CLI.
#[derive(Debug, Clone)]
pub struct LogNavigator {
    base_url: String,
}

impl LogNavigator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn target(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Navigator for LogNavigator {
    fn redirect(&self, path: &str) {
        warn!(target_url = %self.target(path), "Session invalidated, sign in again");
    }
}

/// Records redirects for testing.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, path: &str) {
        self.redirects.lock().push(path.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_navigator_target() {
        let nav = LogNavigator::new("http://localhost:3000/");
        assert_eq!(nav.target("/login"), "http://localhost:3000/login");
    }

    #[test]
    fn test_recording_navigator() {
        let nav = RecordingNavigator::new();
        nav.redirect("/login");
        assert_eq!(nav.redirects(), vec!["/login"]);
    }
}
