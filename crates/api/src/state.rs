//! Application state for the API server.

use std::sync::Arc;

use medcoord_coordinator::{CoordinatorConfig, Session};

/// Shared application state for the API server.
pub struct AppState {
    /// The single conversation served by this process
    pub session: Arc<Session>,

    /// Provider type from the configuration, reported by `/health`
    pub provider: String,

    /// Server start time (for health checks)
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create new application state with the given coordinator configuration.
    pub fn new(config: CoordinatorConfig) -> medcoord_common::Result<Self> {
        let session = Session::from_config(&config)?;
        Ok(Self::with_session(
            Arc::new(session),
            config.provider.provider_type,
        ))
    }

    /// Wrap an already built session (tests, custom clients).
    pub fn with_session(session: Arc<Session>, provider: impl Into<String>) -> Self {
        Self {
            session,
            provider: provider.into(),
            start_time: std::time::Instant::now(),
        }
    }

    /// Get the uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
