/// Auth Manager - Security headers middleware.
///
/// Adds to every response:
/// - `X-Content-Type-Options: nosniff`
/// - `X-Frame-Options: DENY`
/// - `Content-Security-Policy` allowing only same-origin resources and the
///   Bootstrap CDN used by the layout
/// - `Referrer-Policy: same-origin`, so the remove confirmation page gets the
///   referring list URL but other sites get nothing
/// - `Cache-Control: no-store` for pages carrying CSRF tokens
use axum::{
    body::Body,
    http::{Request, Response, header::HeaderValue},
    middleware::Next,
};

/// CDN origin of the Bootstrap stylesheet and script.
pub const BOOTSTRAP_CDN: &str = "https://cdn.jsdelivr.net";

pub async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static(
            "default-src 'self'; \
             script-src 'self' https://cdn.jsdelivr.net; \
             style-src 'self' https://cdn.jsdelivr.net; \
             img-src 'self' data:; \
             base-uri 'self'; \
             form-action 'self'; \
             frame-ancestors 'none'",
        ),
    );
    headers.insert("referrer-policy", HeaderValue::from_static("same-origin"));
    headers
        .entry("cache-control")
        .or_insert(HeaderValue::from_static("no-store"));

    response
}
