use crate::provider::RetryPolicy;
use crate::util::env::env_parse;

/// Knobs shared by the import, career and event services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub retry: RetryPolicy,
    /// Pause after each per-fixture event fetch.
    pub event_delay_ms: u64,
    /// Event catch-up cap when run as the tail of a full import.
    pub import_event_limit: i64,
    /// Event catch-up cap for standalone runs.
    pub event_limit: i64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            event_delay_ms: 300,
            import_event_limit: 2000,
            event_limit: 50,
        }
    }
}

impl SyncConfig {
    /// `SYNC_MAX_ATTEMPTS`, `SYNC_BACKOFF_MS`, `SYNC_EVENT_DELAY_MS`,
    /// `SYNC_IMPORT_EVENT_LIMIT`, `SYNC_EVENT_LIMIT`; unset or unparsable keys
    /// fall back to the defaults.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            retry: RetryPolicy {
                max_attempts: env_parse("SYNC_MAX_ATTEMPTS", d.retry.max_attempts).max(1),
                initial_backoff_ms: env_parse("SYNC_BACKOFF_MS", d.retry.initial_backoff_ms),
            },
            event_delay_ms: env_parse("SYNC_EVENT_DELAY_MS", d.event_delay_ms),
            import_event_limit: env_parse("SYNC_IMPORT_EVENT_LIMIT", d.import_event_limit),
            event_limit: env_parse("SYNC_EVENT_LIMIT", d.event_limit),
        }
    }
}
