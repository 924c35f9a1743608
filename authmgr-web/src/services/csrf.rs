/// Auth Manager - CSRF token service for controllers.
use axum_extra::extract::{CookieJar, cookie::Cookie};

use crate::middleware::csrf::{
    CSRF_COOKIE_NAME, build_csrf_cookie, generate_csrf_token, validate_double_submit,
    verify_csrf_token,
};

/// Issues tokens for forms and checks submitted ones.
pub trait CsrfService {
    fn new_token(&self) -> String;
    fn validate_token(&self, token: &str) -> bool;
}

/// Double-submit cookie CSRF for one request.
///
/// Forms get the request's cookie token when it is valid, otherwise a newly
/// minted one whose cookie must be attached to the response.
#[derive(Debug, Clone)]
pub struct CookieCsrf {
    secret_key: Vec<u8>,
    cookie_token: Option<String>,
    token: String,
    minted: bool,
}

impl CookieCsrf {
    pub fn from_jar(secret_key: &[u8], jar: &CookieJar) -> Self {
        let cookie_token = jar.get(CSRF_COOKIE_NAME).map(|c| c.value().to_string());
        let reusable = cookie_token
            .as_deref()
            .filter(|t| verify_csrf_token(secret_key, t))
            .map(str::to_string);

        let (token, minted) = match reusable {
            Some(token) => (token, false),
            None => (generate_csrf_token(secret_key), true),
        };

        Self {
            secret_key: secret_key.to_vec(),
            cookie_token,
            token,
            minted,
        }
    }

    /// Cookie to attach when the token was minted for this request.
    pub fn cookie(&self, secure: bool) -> Option<Cookie<'static>> {
        self.minted.then(|| build_csrf_cookie(&self.token, secure))
    }

    /// Add the minted token's cookie, if any, to `jar`.
    pub fn attach(&self, jar: CookieJar, secure: bool) -> CookieJar {
        match self.cookie(secure) {
            Some(cookie) => jar.add(cookie),
            None => jar,
        }
    }
}

impl CsrfService for CookieCsrf {
    fn new_token(&self) -> String {
        self.token.clone()
    }

    fn validate_token(&self, token: &str) -> bool {
        validate_double_submit(&self.secret_key, self.cookie_token.as_deref(), token)
    }
}
