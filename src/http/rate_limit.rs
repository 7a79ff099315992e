//! Per-identity, per-route fixed-window rate limiting.
//!
//! Counters are keyed `identifier:route` and live in a process-local map.
//! The window is fixed, not sliding: a counter starts with the first
//! request and resets when its window expires, which permits bursts
//! clustered at a window boundary to reach up to twice the nominal rate.
//! That artifact is accepted and documented rather than silently traded
//! for the extra state a sliding window needs.
//!
//! The store is constructed at process start and injected through
//! `AppState`; replacing it with a shared external store (required for
//! correct enforcement across multiple replicas — each replica otherwise
//! enforces its own independent quota) only touches the composition site.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::net::SocketAddr;

use super::error::AppError;

const DEFAULT_WINDOW: Duration = Duration::from_secs(15 * 60);
const DEFAULT_MESSAGE: &str = "Too many requests, please try again later.";

/// Identity of an authenticated caller, inserted into request extensions
/// by the upstream identity layer. Takes priority over network-layer
/// signals when resolving the rate-limit identity.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: String,
}

/// Quota configuration attached to a route at registration time.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_requests: u32,
    /// Message returned on rejection; a default is used when unset.
    pub message: Option<String>,
}

impl RateLimitConfig {
    /// 10 requests per 15 minutes.
    pub fn strict() -> Self {
        Self::custom(DEFAULT_WINDOW, 10)
    }

    /// 100 requests per 15 minutes.
    pub fn moderate() -> Self {
        Self::custom(DEFAULT_WINDOW, 100)
    }

    /// 1000 requests per 15 minutes.
    pub fn lenient() -> Self {
        Self::custom(DEFAULT_WINDOW, 1000)
    }

    pub fn custom(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn rejection_message(&self) -> &str {
        self.message.as_deref().unwrap_or(DEFAULT_MESSAGE)
    }
}

#[derive(Debug, Clone, Copy)]
struct RateLimitEntry {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Outcome of an admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed {
        limit: u32,
        remaining: u32,
        reset_epoch: i64,
    },
    Rejected {
        limit: u32,
        retry_after_secs: i64,
        reset_epoch: i64,
    },
}

/// Process-local fixed-window counters.
pub struct RateLimitStore {
    entries: Mutex<HashMap<String, RateLimitEntry>>,
}

impl RateLimitStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Count one request against `key` and decide admission.
    ///
    /// The whole read-modify-write runs under the store lock with no await
    /// points, so concurrent handler invocations cannot interleave inside
    /// a window update.
    pub fn check(
        &self,
        key: &str,
        config: &RateLimitConfig,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        let window = chrono::Duration::from_std(config.window)
            .unwrap_or_else(|_| chrono::Duration::minutes(15));

        let mut entries = self.entries.lock();
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| RateLimitEntry {
                count: 0,
                reset_at: now + window,
            });

        // Expired window: replace the entry and start counting fresh.
        if now > entry.reset_at {
            *entry = RateLimitEntry {
                count: 0,
                reset_at: now + window,
            };
        }

        entry.count += 1;
        let reset_epoch = entry.reset_at.timestamp();

        if entry.count > config.max_requests {
            RateLimitDecision::Rejected {
                limit: config.max_requests,
                retry_after_secs: (entry.reset_at - now).num_seconds().max(1),
                reset_epoch,
            }
        } else {
            RateLimitDecision::Allowed {
                limit: config.max_requests,
                remaining: config.max_requests - entry.count,
                reset_epoch,
            }
        }
    }

    /// Remove entries whose window has expired. Run periodically to bound
    /// memory; admission itself never removes anything.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.reset_at >= now);
        before - entries.len()
    }

    /// Number of live counter entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for RateLimitStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn the periodic expired-entry sweep.
pub fn spawn_sweeper(
    store: Arc<RateLimitStore>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // First tick completes immediately; skip it.
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = store.sweep_expired(Utc::now());
            if removed > 0 {
                tracing::debug!(removed, "swept expired rate-limit entries");
            }
        }
    })
}

/// Resolve the client identity for rate limiting.
///
/// Priority order: authenticated user id, API key header, first address of
/// the forwarded-for chain, raw peer address. Authenticated identity is
/// trusted over network-layer signals.
pub fn client_identifier(req: &Request) -> String {
    if let Some(user) = req.extensions().get::<AuthenticatedUser>() {
        return format!("user:{}", user.id);
    }

    if let Some(key) = req
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    {
        return format!("key:{}", key);
    }

    if let Some(first) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|chain| chain.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return format!("ip:{}", first);
    }

    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return format!("ip:{}", addr.ip());
    }

    "ip:unknown".to_string()
}

fn insert_header(response: &mut Response, name: &'static str, value: String) {
    if let Ok(value) = HeaderValue::from_str(&value) {
        response.headers_mut().insert(name, value);
    }
}

/// Middleware body enforcing a route's quota. Admitted responses carry the
/// `X-RateLimit-*` headers; rejections short-circuit with 429.
pub async fn enforce(
    store: Arc<RateLimitStore>,
    route: &'static str,
    config: RateLimitConfig,
    req: Request,
    next: Next,
) -> Response {
    let identifier = client_identifier(&req);
    let key = format!("{}:{}", identifier, route);

    match store.check(&key, &config, Utc::now()) {
        RateLimitDecision::Allowed {
            limit,
            remaining,
            reset_epoch,
        } => {
            let mut response = next.run(req).await;
            insert_header(&mut response, "x-ratelimit-limit", limit.to_string());
            insert_header(&mut response, "x-ratelimit-remaining", remaining.to_string());
            insert_header(&mut response, "x-ratelimit-reset", reset_epoch.to_string());
            response
        }
        RateLimitDecision::Rejected {
            limit,
            retry_after_secs,
            reset_epoch,
        } => {
            tracing::warn!(
                identifier = %identifier,
                route,
                limit,
                "rate limit exceeded"
            );
            let mut response = AppError::RateLimited {
                message: config.rejection_message().to_string(),
                retry_after_secs,
            }
            .into_response();
            insert_header(&mut response, "x-ratelimit-limit", limit.to_string());
            insert_header(&mut response, "x-ratelimit-remaining", "0".to_string());
            insert_header(&mut response, "x-ratelimit-reset", reset_epoch.to_string());
            insert_header(&mut response, "retry-after", retry_after_secs.to_string());
            response
        }
    }
}
