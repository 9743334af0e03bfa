//! Runner options

use std::time::Duration;

/// Options applied to every test of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Cancel a test body after this long
    pub test_timeout: Option<Duration>,
    /// Only run tests whose name contains this text
    pub name_filter: Option<String>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_test_timeout(mut self, timeout: Duration) -> Self {
        self.test_timeout = Some(timeout);
        self
    }

    pub fn with_name_filter(mut self, filter: impl Into<String>) -> Self {
        self.name_filter = Some(filter.into());
        self
    }

    pub(crate) fn selects(&self, test_name: &str) -> bool {
        self.name_filter
            .as_deref()
            .is_none_or(|filter| test_name.contains(filter))
    }
}
