/// Auth Manager - CSRF protection helpers.
///
/// Implements signed CSRF tokens using HMAC-SHA3-256 and a double-submit cookie.
use axum::{
    extract::{Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use rand::{RngCore, rngs::OsRng};
use time::Duration;

use crate::AppState;
use crate::signing::{base64_encode, sign_value, verify_signed};

/// Cookie name for CSRF tokens.
pub const CSRF_COOKIE_NAME: &str = "__authmgr_csrf";

/// Generate a signed CSRF token (token.signature).
pub fn generate_csrf_token(secret_key: &[u8]) -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    sign_value(secret_key, &base64_encode(&bytes))
}

/// Build the CSRF cookie. Readable by scripts, same-site only, one hour.
pub fn build_csrf_cookie(token: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((CSRF_COOKIE_NAME, token.to_string()))
        .path("/")
        .http_only(false)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(Duration::hours(1))
        .build()
}

/// Verify a signed CSRF token.
pub fn verify_csrf_token(secret_key: &[u8], token: &str) -> bool {
    verify_signed(secret_key, token).is_some()
}

/// Validate a double-submit CSRF token (cookie == form, signature valid).
pub fn validate_double_submit(
    secret_key: &[u8],
    cookie_value: Option<&str>,
    form_value: &str,
) -> bool {
    if form_value.is_empty() || cookie_value != Some(form_value) {
        return false;
    }
    verify_csrf_token(secret_key, form_value)
}

/// Middleware to ensure a CSRF cookie exists on responses.
///
/// Adds a cookie only when the request had no valid CSRF cookie and the
/// handler did not set one itself, so the two never disagree.
pub async fn csrf_cookie_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(req.headers());
    let secret = state.config.signing_key();

    let needs_cookie = jar
        .get(CSRF_COOKIE_NAME)
        .map(|c| c.value())
        .filter(|val| verify_csrf_token(secret, val))
        .is_none();

    let mut response = next.run(req).await;

    if needs_cookie {
        let handler_set_cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .any(|v| {
                v.to_str()
                    .map(|s| s.starts_with(CSRF_COOKIE_NAME))
                    .unwrap_or(false)
            });

        if !handler_set_cookie {
            let token = generate_csrf_token(secret);
            let cookie = build_csrf_cookie(&token, state.config.security.secure_cookies);
            if let Ok(value) = cookie.to_string().parse() {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }
    }

    response
}
