/// Auth Manager - Flash messages middleware.
///
/// One-time messages carried across a redirect in a signed cookie
/// (HMAC-SHA3-256). The next page that reads them clears the cookie.
use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::SET_COOKIE, request::Parts},
    middleware::Next,
    response::{IntoResponse, IntoResponseParts, Redirect, Response, ResponseParts},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::signing::{base64_decode, base64_encode, sign_value, verify_signed};

/// Cookie name for flash messages.
pub const FLASH_COOKIE_NAME: &str = "__authmgr_flash";

/// Severity of a flash message, named after the Bootstrap alert classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    #[default]
    Info,
    Warning,
    Danger,
}

impl FlashLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

/// Flash message structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub message: String,
}

impl FlashMessage {
    pub fn new(level: FlashLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Info, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Danger, message)
    }
}

/// Signing settings for flash cookies.
/// Add this to request extensions via middleware.
#[derive(Clone)]
pub struct FlashKey {
    pub secret_key: Vec<u8>,
    pub secure: bool,
}

impl std::fmt::Debug for FlashKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlashKey")
            .field("secret_key", &"[REDACTED]")
            .field("secure", &self.secure)
            .finish()
    }
}

/// Flash messages container for responses.
/// Use this to add flash messages that will be available on the next request.
#[derive(Debug, Clone)]
pub struct Flash {
    messages: Vec<FlashMessage>,
    secret_key: Vec<u8>,
    secure: bool,
}

impl Flash {
    pub fn new(key: &FlashKey) -> Self {
        Self {
            messages: Vec::new(),
            secret_key: key.secret_key.clone(),
            secure: key.secure,
        }
    }

    /// Add a message.
    pub fn push(mut self, message: FlashMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn success(self, message: impl Into<String>) -> Self {
        self.push(FlashMessage::success(message))
    }

    pub fn danger(self, message: impl Into<String>) -> Self {
        self.push(FlashMessage::danger(message))
    }

    /// Signed cookie value: base64(json).signature
    fn create_signed_value(&self) -> Option<String> {
        if self.messages.is_empty() {
            return None;
        }
        let json = serde_json::to_string(&self.messages).ok()?;
        Some(sign_value(&self.secret_key, &base64_encode(json.as_bytes())))
    }
}

impl IntoResponseParts for Flash {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if let Some(signed_value) = self.create_signed_value() {
            let cookie = Cookie::build((FLASH_COOKIE_NAME, signed_value))
                .path("/")
                .http_only(true)
                .secure(self.secure)
                .same_site(SameSite::Lax)
                .max_age(Duration::seconds(30))
                .build();

            if let Ok(header_value) = cookie.to_string().parse() {
                res.headers_mut().append(SET_COOKIE, header_value);
            }
        }
        Ok(res)
    }
}

/// Incoming flash messages extractor.
#[derive(Debug, Clone)]
pub struct IncomingFlash {
    messages: Vec<FlashMessage>,
    key: Option<FlashKey>,
}

impl IncomingFlash {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The message to show on the current page, if any.
    pub fn pending(&self) -> Option<FlashMessage> {
        self.messages.first().cloned()
    }

    /// Create a new Flash for adding messages to the response.
    pub fn flash(&self) -> Flash {
        match &self.key {
            Some(key) => Flash::new(key),
            None => Flash::new(&FlashKey {
                secret_key: Vec::new(),
                secure: true,
            }),
        }
    }

    /// Cookie removal to send once the messages have been shown.
    pub fn clear(&self) -> Option<ClearFlashCookie> {
        (!self.is_empty()).then(|| ClearFlashCookie {
            secure: self.key.as_ref().is_none_or(|k| k.secure),
        })
    }

    fn verify_and_decode(secret_key: &[u8], signed_value: &str) -> Option<Vec<FlashMessage>> {
        let encoded = verify_signed(secret_key, signed_value)?;
        let json = base64_decode(encoded)?;
        serde_json::from_slice(&json).ok()
    }
}

impl<S> FromRequestParts<S> for IncomingFlash
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let key = parts.extensions.get::<FlashKey>().cloned();
        let jar = CookieJar::from_headers(&parts.headers);

        let messages = match (&key, jar.get(FLASH_COOKIE_NAME)) {
            (Some(key), Some(cookie)) => {
                IncomingFlash::verify_and_decode(&key.secret_key, cookie.value())
                    .unwrap_or_default()
            }
            _ => Vec::new(),
        };

        Ok(IncomingFlash { messages, key })
    }
}

/// Response part that clears the flash cookie.
pub struct ClearFlashCookie {
    secure: bool,
}

impl IntoResponseParts for ClearFlashCookie {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        let cookie = Cookie::build((FLASH_COOKIE_NAME, ""))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(Duration::ZERO)
            .build();

        if let Ok(header_value) = cookie.to_string().parse() {
            res.headers_mut().append(SET_COOKIE, header_value);
        }
        Ok(res)
    }
}

/// Flash middleware that injects the signing key into request extensions.
pub async fn flash_middleware(
    State(key): State<FlashKey>,
    mut request: Request,
    next: Next,
) -> Response {
    request.extensions_mut().insert(key);
    next.run(request).await
}

/// Set a flash cookie and redirect with 303 See Other (POST-Redirect-GET).
///
/// The destination page's GET handler reads and clears the cookie.
pub fn flash_redirect(flash: Flash, location: &str) -> Response {
    (flash, Redirect::to(location)).into_response()
}
