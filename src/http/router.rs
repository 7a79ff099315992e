//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, the per-route rate-limit guards, and the
//! middleware stack (CORS, compression, tracing, error boundary).

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware::{self, Next},
    routing::get,
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::error;
use super::handlers;
use super::rate_limit::{self, RateLimitConfig, RateLimitStore};
use super::state::AppState;
use super::ws;

fn rate_limit_guard(
    store: Arc<RateLimitStore>,
    route: &'static str,
    config: RateLimitConfig,
) -> impl Fn(Request, Next) -> futures::future::BoxFuture<'static, axum::response::Response> + Clone
{
    move |req, next| {
        Box::pin(rate_limit::enforce(
            store.clone(),
            route,
            config.clone(),
            req,
            next,
        ))
    }
}

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let moderate = middleware::from_fn(rate_limit_guard(
        state.rate_limits.clone(),
        "api",
        RateLimitConfig::moderate(),
    ));
    // Assignment mutates two schedules and a work order per call; quota it
    // tightly and name it in the rejection.
    let strict = middleware::from_fn(rate_limit_guard(
        state.rate_limits.clone(),
        "work_orders:assign",
        RateLimitConfig::strict()
            .with_message("Too many requests to this sensitive endpoint, please slow down."),
    ));

    let general = Router::new()
        // Schedule CRUD + stats
        .route(
            "/schedules",
            get(handlers::list_schedules).post(handlers::create_schedule),
        )
        .route("/schedules/utilization", get(handlers::utilization_stats))
        .route(
            "/schedules/{schedule_id}",
            get(handlers::get_schedule).patch(handlers::update_schedule),
        )
        // Technicians
        .route(
            "/technicians",
            get(handlers::list_technicians).post(handlers::create_technician),
        )
        .route("/technicians/{technician_id}", get(handlers::get_technician))
        // Work orders
        .route(
            "/work-orders",
            get(handlers::list_work_orders).post(handlers::create_work_order),
        )
        .route("/work-orders/{work_order_id}", get(handlers::get_work_order))
        .route_layer(moderate);

    let assignment = Router::new()
        .route(
            "/work-orders/{work_order_id}/assign",
            axum::routing::post(handlers::assign_work_order),
        )
        .route_layer(strict);

    // The WebSocket endpoint is long-lived and not rate limited.
    let api_v1 = general
        .merge(assignment)
        .route("/ws", get(ws::websocket));

    // Combine all routes
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(middleware::from_fn(error::error_boundary))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
