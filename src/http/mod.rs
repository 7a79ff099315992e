//! Axum-based HTTP server: REST handlers, WebSocket endpoint, rate
//! limiting, and the uniform error boundary.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod router;
pub mod state;
pub mod ws;

pub use error::{ApiError, AppError};
pub use rate_limit::{AuthenticatedUser, RateLimitConfig, RateLimitStore};
pub use router::create_router;
pub use state::AppState;
