//! Auth Manager - HTTP handlers.
//!
//! Handlers extract request data, call the controllers and turn their
//! `ViewResponse` into HTML pages or 303 redirects.

pub mod groups;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{CookieJar, cookie::Cookie};
use url::form_urlencoded;

use crate::AppState;
use crate::forms::{GROUP_LIST_URL, is_local_path};
use crate::middleware::csrf::{CSRF_COOKIE_NAME, validate_double_submit};
use crate::services::session::SESSION_COOKIE_NAME;

/// Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.storage.ping().await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "Storage unavailable")
        }
    }
}

/// `/` has no page of its own.
pub async fn root() -> Redirect {
    Redirect::to(GROUP_LIST_URL)
}

/// Drop the session cookie and go back to the page the user was on.
///
/// That page then sends the now anonymous user on to the login URL. A
/// request without a matching CSRF token keeps its session.
pub async fn logout(State(state): State<AppState>, jar: CookieJar, body: Bytes) -> Response {
    let mut location = None;
    let mut token = String::new();
    for (key, value) in form_urlencoded::parse(&body) {
        match key.as_ref() {
            "originalUrl" => location = Some(value.into_owned()),
            "token" => token = value.into_owned(),
            _ => {}
        }
    }
    let location = location
        .filter(|url| is_local_path(url))
        .unwrap_or_else(|| GROUP_LIST_URL.to_string());

    let csrf_cookie = jar.get(CSRF_COOKIE_NAME).map(|c| c.value());
    if !validate_double_submit(state.config.signing_key(), csrf_cookie, &token) {
        tracing::warn!("Logout refused: invalid CSRF token");
        return Redirect::to(&location).into_response();
    }

    tracing::info!("User logged out");
    let jar = jar.remove(Cookie::build(SESSION_COOKIE_NAME).path("/"));
    (jar, Redirect::to(&location)).into_response()
}
