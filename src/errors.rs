use axum::http::StatusCode;
use tracing::error;

/// Handler error shape: status plus a plain-text message.
pub type ApiError = (StatusCode, String);

pub fn internal<E: std::fmt::Display>(e: E) -> ApiError {
    error!(error = %e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

pub fn bad_request(msg: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, msg.into())
}

pub fn not_found(msg: impl Into<String>) -> ApiError {
    (StatusCode::NOT_FOUND, msg.into())
}

/// Upstream model failure. The detail is logged, not returned.
pub fn bad_gateway<E: std::fmt::Display>(e: E, msg: &str) -> ApiError {
    error!(error = %e, "{}", msg);
    (StatusCode::BAD_GATEWAY, msg.to_string())
}
