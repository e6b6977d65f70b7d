use std::time::Instant;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;
use wayfare_api::ApiError;

use crate::auth::JwtVerifier;

// =============================================================================
// Authentication Middleware
// =============================================================================

/// Bearer-token gate for administrative routes.
///
/// Passes the request through untouched when no verifier is configured
/// (auth disabled). Otherwise requires `Authorization: Bearer <jwt>` and
/// stores the verified claims in request extensions.
pub async fn require_bearer(
    State(verifier): State<Option<JwtVerifier>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(verifier) = verifier else {
        return next.run(req).await;
    };

    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match verifier.verify_header(header) {
        Ok(claims) => {
            tracing::debug!(subject = %claims.sub, "Token validated successfully");
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(e) => {
            tracing::debug!(path = %req.uri().path(), error = %e, "Token validation failed");
            ApiError::unauthorized(e.to_string()).into_response()
        }
    }
}

// =============================================================================
// Other Middleware
// =============================================================================

// Middleware that ensures each request has an X-Request-Id and mirrors it on the response
pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    let header_name = HeaderName::from_static("x-request-id");

    // If the incoming request already has a request-id, preserve it; otherwise generate one
    let req_id_value = req.headers().get(&header_name).cloned().unwrap_or_else(|| {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("unknown"))
    });

    // Add to request extensions for downstream usage (e.g., logging)
    req.extensions_mut().insert(req_id_value.clone());

    let mut res = next.run(req).await;

    res.headers_mut().insert(header_name, req_id_value);

    res
}

/// Records request count and latency per method, normalized path and status.
pub async fn record_metrics(req: Request<Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let res = next.run(req).await;

    crate::metrics::record_http_request(&method, &path, res.status().as_u16(), started.elapsed());
    res
}
