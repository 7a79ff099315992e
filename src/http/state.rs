//! Application state for the HTTP server.
//!
//! Every store is constructed explicitly at process start and injected
//! here; there are no module-level singletons. Swapping the repository or
//! the rate-limit store for an external implementation only touches the
//! composition site in the server binary.

use std::sync::Arc;

use super::rate_limit::RateLimitStore;
use crate::db::repository::FullRepository;
use crate::realtime::Hub;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for storage operations
    pub repository: Arc<dyn FullRepository>,
    /// Broadcast hub for real-time rooms
    pub hub: Arc<Hub>,
    /// Fixed-window rate limit counters
    pub rate_limits: Arc<RateLimitStore>,
}

impl AppState {
    /// Create a new application state from its injected stores.
    pub fn new(
        repository: Arc<dyn FullRepository>,
        hub: Arc<Hub>,
        rate_limits: Arc<RateLimitStore>,
    ) -> Self {
        Self {
            repository,
            hub,
            rate_limits,
        }
    }
}
