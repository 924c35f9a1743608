/// Auth Manager - Authentication middleware.
///
/// Verifies the signed session cookie and places the user in request
/// extensions. Web handlers extract `WebAuthUser`, which redirects to the
/// login page when there is no valid session.
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::AppError;
use crate::services::session::{SESSION_COOKIE_NAME, decode_session};

/// Login page used when the middleware did not run.
pub const DEFAULT_LOGIN_URL: &str = "/auth/login";

/// Authenticated user context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub username: String,
    pub permissions: Vec<String>,
}

/// Configured login page, placed in request extensions by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct LoginUrl(pub String);

/// Web page authentication extractor.
/// Redirects to the login page when the request has no valid session.
#[derive(Debug, Clone)]
pub struct WebAuthUser(pub AuthUser);

impl std::ops::Deref for WebAuthUser {
    type Target = AuthUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for WebAuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(WebAuthUser)
            .ok_or_else(|| {
                let login_url = parts
                    .extensions
                    .get::<LoginUrl>()
                    .map(|u| u.0.clone())
                    .unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string());
                AppError::AuthRedirect(login_url)
            })
    }
}

/// Extract the authenticated user from the session cookie.
///
/// Invalid or expired sessions are ignored; handlers decide whether a user
/// is required.
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    request
        .extensions_mut()
        .insert(LoginUrl(state.config.security.login_url.clone()));

    if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
        match decode_session(state.config.signing_key(), cookie.value()) {
            Some(claims) => {
                request.extensions_mut().insert(AuthUser {
                    username: claims.username,
                    permissions: claims.permissions,
                });
            }
            None => tracing::debug!("Session cookie rejected (invalid or expired)"),
        }
    }

    next.run(request).await
}
