/// Auth Manager - Layout context shared by all pages.
use crate::middleware::auth::{AuthUser, DEFAULT_LOGIN_URL};
use crate::middleware::flash::FlashMessage;

/// User shown in the navbar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    pub username: String,
}

impl From<&AuthUser> for UserContext {
    fn from(user: &AuthUser) -> Self {
        Self {
            username: user.username.clone(),
        }
    }
}

/// Data used by `base.html` around every page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutContext {
    pub user: Option<UserContext>,
    /// Path and query of the current page, posted back on logout.
    pub current_url: String,
    pub login_url: String,
    /// CSRF token posted with the logout form.
    pub csrf_token: Option<String>,
    /// One-time message shown above the page content.
    pub message: Option<FlashView>,
}

impl LayoutContext {
    pub fn new(
        user: Option<UserContext>,
        current_url: impl Into<String>,
        login_url: impl Into<String>,
    ) -> Self {
        Self {
            user,
            current_url: current_url.into(),
            login_url: login_url.into(),
            csrf_token: None,
            message: None,
        }
    }

    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    pub fn with_message(mut self, message: Option<&FlashMessage>) -> Self {
        self.message = message.map(FlashView::from);
        self
    }

    /// Layout for responses built without request context.
    pub fn anonymous() -> Self {
        Self::new(None, "/", DEFAULT_LOGIN_URL)
    }
}

/// Flash message as rendered in an alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashView {
    /// Bootstrap alert class suffix.
    pub level: String,
    pub message: String,
}

impl From<&FlashMessage> for FlashView {
    fn from(message: &FlashMessage) -> Self {
        Self {
            level: message.level.as_str().to_string(),
            message: message.message.clone(),
        }
    }
}
