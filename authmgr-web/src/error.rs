/// Auth Manager - Custom error types.
///
/// All errors use `thiserror` for proper error handling without `unwrap()`.
use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::templates::base::LayoutContext;
use crate::templates::errors::NotFoundTemplate;

/// Content that could not be located, with a suggestion of where to go next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentNotFound {
    pub title: String,
    pub message: String,
    pub recommended_url: String,
    pub recommended_action: String,
}

impl ContentNotFound {
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        recommended_url: impl Into<String>,
        recommended_action: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            recommended_url: recommended_url.into(),
            recommended_action: recommended_action.into(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn recommended_url(&self) -> &str {
        &self.recommended_url
    }

    pub fn recommended_action(&self) -> &str {
        &self.recommended_action
    }
}

impl std::fmt::Display for ContentNotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Authentication required - redirect to {0}")]
    AuthRedirect(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(ContentNotFound),

    #[error("Duplicate entity: {field} is already taken")]
    Duplicate { field: String },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Duplicate value for the given field.
    pub fn duplicate(field: impl Into<String>) -> Self {
        AppError::Duplicate {
            field: field.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthRedirect(login_url) => {
                return Redirect::to(&login_url).into_response();
            }
            AppError::NotFound(not_found) => {
                return render_not_found(&not_found, LayoutContext::anonymous());
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database operation failed".to_string(),
                )
            }
            AppError::Authorization(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Duplicate { field } => {
                (StatusCode::CONFLICT, format!("The {} is already taken", field))
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Config(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Configuration error".to_string(),
                )
            }
        };

        (status, error_message).into_response()
    }
}

/// Render the not-found page with a 404 status.
pub fn render_not_found(not_found: &ContentNotFound, layout: LayoutContext) -> Response {
    match NotFoundTemplate::new(not_found, layout).render() {
        Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Template render error: {}", e);
            (StatusCode::NOT_FOUND, not_found.message.clone()).into_response()
        }
    }
}

/// Result type alias for convenience.
pub type AppResult<T> = Result<T, AppError>;
