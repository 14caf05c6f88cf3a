//! Application state container
//!
//! Shared state passed to all request handlers via Axum's state
//! extraction. Settings are loaded once at startup and immutable from
//! then on; no Cosmos session is held here, each request opens and
//! releases its own.

use crate::config::Settings;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Application start time (for uptime calculation)
    pub start_time: Instant,
}

impl AppState {
    /// Create a new application state
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(settings),
            start_time: Instant::now(),
        }
    }

    /// Get the application uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
