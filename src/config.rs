//! Session configuration

use std::time::Duration;

use crate::limits::*;

/// Settings shared by every seating session a process opens.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Seating service base URL (e.g. "http://localhost:8080/api")
    pub base_url: String,

    /// Bearer token for the seating service
    pub token: Option<String>,

    /// Quiet period after the last edit before a snapshot is pushed
    pub debounce: Duration,

    /// How often the persisted snapshot is polled for remote changes
    pub poll_interval: Duration,

    pub request_timeout: Duration,

    /// Prefix of generated table names ("Table 3 - Family")
    pub table_label: String,

    /// Reject local edits; no pushes and no polling
    pub read_only: bool,

    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new("http://localhost:8080")
    }
}

impl SessionConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            table_label: "Table".into(),
            read_only: false,
            max_sessions: MAX_SESSIONS,
        }
    }

    /// Read `SEATPLAN_*` variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::new(
            std::env::var("SEATPLAN_API_URL").unwrap_or_else(|_| "http://localhost:8080".into()),
        );
        config.token = std::env::var("SEATPLAN_TOKEN").ok().filter(|t| !t.is_empty());
        if let Some(ms) = env_parse::<u64>("SEATPLAN_DEBOUNCE_MS") {
            config.debounce = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>("SEATPLAN_POLL_INTERVAL_MS") {
            config.poll_interval = Duration::from_millis(ms.max(1));
        }
        if let Some(secs) = env_parse::<u64>("SEATPLAN_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Ok(label) = std::env::var("SEATPLAN_TABLE_LABEL")
            && !label.trim().is_empty()
        {
            config.table_label = label;
        }
        config.read_only = env_parse::<bool>("SEATPLAN_READ_ONLY").unwrap_or(false);
        if let Some(n) = env_parse::<usize>("SEATPLAN_MAX_SESSIONS") {
            config.max_sessions = n;
        }
        config
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_table_label(mut self, label: impl Into<String>) -> Self {
        self.table_label = label.into();
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max;
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
