//! Auth Manager - Library crate exposing all modules.
//!
//! The server binary and the integration tests build the application from
//! `build_router`.

// Clippy lints to enforce proper error handling
// Note: Using warn instead of deny to allow #[allow] annotations to work
// with code that requires expect (e.g., HMAC keys of any length)
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::panic)]
#![warn(clippy::todo)]

// Test utilities - macros for replacing unwrap/expect in tests
#[macro_use]
pub mod test_utils;

pub mod config;
pub mod controllers;
pub mod db;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod schema;
pub mod services;
pub mod signing;
pub mod templates;
pub mod validation;
pub mod views;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use config::Config;
use middleware::flash::FlashKey;
use repository::Storage;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub storage: Storage,
}

impl AppState {
    pub fn new(config: Config, storage: Storage) -> Self {
        Self {
            config: Arc::new(config),
            storage,
        }
    }

    /// Signing settings for flash cookies.
    pub fn flash_key(&self) -> FlashKey {
        FlashKey {
            secret_key: self.config.signing_key().to_vec(),
            secure: self.config.security.secure_cookies,
        }
    }
}

/// Build the application router with every route and middleware layer.
pub fn build_router(state: AppState) -> Router {
    use handlers::groups;

    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/auth/logout", post(handlers::logout))
        .route("/groups", get(groups::group_list))
        .route("/groups/", get(groups::group_list))
        .route("/groups/new", get(groups::group_new).post(groups::group_create))
        .route(
            "/groups/detail/{name}",
            get(groups::group_detail).post(groups::group_update),
        )
        .route(
            "/groups/remove",
            get(groups::group_remove_confirm).post(groups::group_remove),
        )
        .route(
            "/groups/update-permissions/{name}",
            post(groups::group_update_permissions),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    timeout,
                ))
                // Security headers (clickjacking, MIME sniffing, CSP)
                .layer(axum::middleware::from_fn(
                    middleware::security::security_headers_middleware,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    middleware::csrf::csrf_cookie_middleware,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    state.flash_key(),
                    middleware::flash::flash_middleware,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    middleware::auth::auth_middleware,
                )),
        )
        .with_state(state)
}
