//! HTTP error handling and the uniform response boundary.
//!
//! Every failure leaving the API resolves to the same body shape: status
//! code, category label, sanitized message, timestamp, request path and
//! method, and a correlation id that links the response to server-side
//! logs. Internal detail is logged under the correlation id and never
//! reflected to the client.

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::Advisory;
use crate::db::repository::RepositoryError;
use crate::services::SchedulingError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// HTTP status code, mirrored into the body
    pub status_code: u16,
    /// Category label for programmatic handling
    pub error: String,
    /// Human-readable, sanitized message
    pub message: String,
    /// Seconds until a rejected request may be retried (rate limiting only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<i64>,
    /// Assignment advisories when a conflict rejection carries them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<Advisory>>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Cross-reference into server logs
    pub correlation_id: String,
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Invalid request (validation error), rejected before any mutation
    BadRequest(String),
    /// Conflicting state; `advisories` is non-empty for assignment
    /// rejections
    Conflict {
        message: String,
        advisories: Vec<Advisory>,
    },
    /// Request admission denied by the rate limiter
    RateLimited {
        message: String,
        retry_after_secs: i64,
    },
    /// Internal server error; the message is logged, never returned
    Internal(String),
}

const INTERNAL_MESSAGE: &str = "An internal error occurred. Please try again later.";

/// Strip path-like and SQL-like tokens from a message reflected to the
/// client. Coarse on purpose; anything suspicious becomes `[redacted]`.
fn sanitize_message(message: &str) -> String {
    const SQL_TOKENS: &[&str] = &[
        "SELECT", "INSERT", "UPDATE", "DELETE", "DROP", "ALTER", "FROM", "WHERE",
    ];

    message
        .split_whitespace()
        .map(|token| {
            let looks_like_path = token.starts_with('/') && token[1..].contains('/');
            let looks_like_sql = SQL_TOKENS.contains(&token.to_uppercase().as_str());
            if looks_like_path || looks_like_sql {
                "[redacted]"
            } else {
                token
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl AppError {
    fn status_and_label(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "Not Found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "Validation Failed"),
            AppError::Conflict { .. } => (StatusCode::CONFLICT, "Conflict"),
            AppError::RateLimited { .. } => (StatusCode::TOO_MANY_REQUESTS, "Rate Limit Exceeded"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, label) = self.status_and_label();
        let correlation_id = uuid::Uuid::new_v4().to_string();

        let (message, retry_after, warnings) = match self {
            AppError::Internal(detail) => {
                tracing::error!(correlation_id = %correlation_id, detail = %detail, "internal error");
                (INTERNAL_MESSAGE.to_string(), None, None)
            }
            AppError::RateLimited {
                message,
                retry_after_secs,
            } => (message, Some(retry_after_secs), None),
            AppError::Conflict { message, advisories } => {
                let warnings = if advisories.is_empty() {
                    None
                } else {
                    Some(advisories)
                };
                (sanitize_message(&message), None, warnings)
            }
            AppError::NotFound(message) | AppError::BadRequest(message) => {
                (sanitize_message(&message), None, None)
            }
        };

        if status != StatusCode::INTERNAL_SERVER_ERROR {
            tracing::debug!(correlation_id = %correlation_id, status = %status, message = %message, "request failed");
        }

        let body = ApiError {
            status_code: status.as_u16(),
            error: label.to_string(),
            message,
            retry_after,
            warnings,
            timestamp: Utc::now(),
            path: None,
            method: None,
            correlation_id,
        };

        let mut response = (status, Json(body.clone())).into_response();
        // Stashed for the boundary middleware, which fills in request
        // path/method and rewrites the body.
        response.extensions_mut().insert(body);
        response
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { message, .. } => AppError::NotFound(message),
            RepositoryError::Conflict { message, .. } => AppError::Conflict {
                message,
                advisories: Vec::new(),
            },
            RepositoryError::ValidationError { message, .. } => AppError::BadRequest(message),
            RepositoryError::InternalError { .. } => AppError::Internal(err.to_string()),
        }
    }
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        match err {
            SchedulingError::Repository(e) => e.into(),
            SchedulingError::Rejected {
                message,
                advisories,
            } => AppError::Conflict {
                message,
                advisories,
            },
            SchedulingError::Validation(message) => AppError::BadRequest(message),
        }
    }
}

/// Boundary middleware: enriches error bodies with the request path and
/// method. Runs outside the per-route guards so rate-limit rejections pass
/// through it too.
pub async fn error_boundary(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let mut response = next.run(req).await;

    if let Some(mut body) = response.extensions_mut().remove::<ApiError>() {
        body.path = Some(path);
        body.method = Some(method);

        if let Ok(bytes) = serde_json::to_vec(&body) {
            let (mut parts, _) = response.into_parts();
            parts.headers.remove(header::CONTENT_LENGTH);
            parts.headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            return Response::from_parts(parts, Body::from(bytes));
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_redacts_paths_and_sql() {
        let sanitized =
            sanitize_message("query SELECT failed at /var/lib/woms/data.db for technician 7");
        assert!(!sanitized.contains("SELECT"));
        assert!(!sanitized.contains("/var/lib"));
        assert!(sanitized.contains("technician 7"));
        assert_eq!(sanitized.matches("[redacted]").count(), 2);
    }

    #[test]
    fn test_sanitize_keeps_ordinary_messages() {
        let message = "technician Dana is not available on 2025-06-02";
        assert_eq!(sanitize_message(message), message);
    }

    #[test]
    fn test_internal_detail_is_not_reflected() {
        let response = AppError::Internal("secret /etc/passwd detail".to_string()).into_response();
        let body = response.extensions().get::<ApiError>().unwrap();
        assert_eq!(body.status_code, 500);
        assert_eq!(body.message, INTERNAL_MESSAGE);
        assert!(!body.correlation_id.is_empty());
    }

    #[test]
    fn test_rate_limited_shape() {
        let response = AppError::RateLimited {
            message: "Too many requests".to_string(),
            retry_after_secs: 42,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let body = response.extensions().get::<ApiError>().unwrap();
        assert_eq!(body.status_code, 429);
        assert_eq!(body.error, "Rate Limit Exceeded");
        assert_eq!(body.retry_after, Some(42));
    }

    #[test]
    fn test_repository_error_mapping() {
        let not_found: AppError = RepositoryError::not_found("schedule 9 not found").into();
        assert!(matches!(not_found, AppError::NotFound(_)));

        let conflict: AppError = RepositoryError::conflict("slot taken").into();
        assert!(matches!(conflict, AppError::Conflict { .. }));
    }
}
