use crate::{
    errors::AppError,
    orders::{OrderStore, User},
};
use axum::{
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

pub const USER_ID_HEADER: &str = "X-User-Id";

const HEADERS: &[(&str, &str)] = &[
    (
        "content-security-policy",
        "default-src 'self'; script-src 'self'; style-src 'self'; img-src 'self' data:; object-src 'none'; base-uri 'self'; frame-ancestors 'none'; form-action 'self'",
    ),
    (
        "permissions-policy",
        "camera=(), microphone=(), geolocation=(), fullscreen=(self)",
    ),
    ("x-content-type-options", "nosniff"),
    ("cross-origin-resource-policy", "same-origin"),
    ("cross-origin-embedder-policy", "require-corp"),
    ("cross-origin-opener-policy", "same-origin"),
    ("cache-control", "no-store"),
];

/// Stamps the fixed response header set on every response.
pub async fn security_headers(req: Request, next: Next) -> Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();
    for &(name, value) in HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    resp
}

/// Identify the caller from `X-User-Id`. The lab trusts the header as-is.
pub fn require_user<'a>(headers: &HeaderMap, store: &'a OrderStore) -> Result<&'a User, AppError> {
    let id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .ok_or(AppError::Unauthenticated)?;
    store.user(id).ok_or(AppError::Unauthenticated)
}
