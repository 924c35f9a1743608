/// Auth Manager - Test infrastructure.
///
/// Common utilities for integration tests.
use axum::http::header::SET_COOKIE;
use axum_test::{TestResponse, TestServer};

use authmgr_web::{
    AppState, build_router,
    config::{Config, Environment},
    middleware::csrf::{CSRF_COOKIE_NAME, generate_csrf_token},
    models::GroupEntity,
    repository::{GroupRepository, Storage},
    services::session::{SESSION_COOKIE_NAME, SessionClaims, encode_session},
};

pub use authmgr_web::{unwrap_ok, unwrap_some};

/// Permission ids of the default in-memory catalog.
pub const ADMIN_ID: i32 = 1;
pub const GROUPS_MANAGE_ID: i32 = 2;
pub const PERMISSIONS_MANAGE_ID: i32 = 3;
pub const USERS_MANAGE_ID: i32 = 4;

/// Test application wrapper.
///
/// Every test gets its own in-memory store so list counts never depend on
/// other tests.
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
}

impl TestApp {
    /// Create a new test application.
    pub async fn spawn() -> TestApp {
        // Load test configuration from config/testing.toml
        let config_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../config");
        let config = Config::load_with_environment(config_dir, Environment::Testing)
            .expect("Failed to load test config from config/testing.toml");

        let state = AppState::new(config, Storage::memory());
        let app = build_router(state.clone());
        let server = TestServer::new(app).expect("Failed to create test server");

        Self { server, state }
    }

    /// Signed session cookie value for a user holding `permissions`.
    pub fn session(&self, username: &str, permissions: &[&str]) -> String {
        let claims = SessionClaims::new(
            username,
            permissions.iter().map(|p| p.to_string()).collect(),
            time::Duration::hours(1),
        );
        unwrap_ok!(encode_session(self.state.config.signing_key(), &claims))
    }

    /// A valid CSRF token for the double-submit cookie.
    pub fn csrf_token(&self) -> String {
        generate_csrf_token(self.state.config.signing_key())
    }

    /// Cookie header of a group manager, with `csrf_token` as CSRF cookie.
    pub fn manager_cookies(&self, csrf_token: &str) -> String {
        format!(
            "{}={}; {}={}",
            SESSION_COOKIE_NAME,
            self.session("manager", &["groups.manage"]),
            CSRF_COOKIE_NAME,
            csrf_token
        )
    }

    /// Store a group directly, bypassing the pages.
    pub async fn seed_group(&self, name: &str, permission_ids: &[i32]) -> GroupEntity {
        let mut group = GroupEntity::from_name(name);
        group.add_permissions(permission_ids);
        unwrap_ok!(self.state.storage.save(&mut group).await);
        group
    }

    pub async fn find_group(&self, name: &str) -> Option<GroupEntity> {
        unwrap_ok!(self.state.storage.by_friendly_name(name).await)
    }

    pub async fn group_count(&self) -> i64 {
        unwrap_ok!(self.state.storage.count().await)
    }
}

/// Response assertion helpers.
pub mod assertions {
    use super::*;

    /// Assert response status code.
    pub fn assert_status(response: &TestResponse, expected: u16) {
        assert_eq!(
            response.status_code().as_u16(),
            expected,
            "Expected status {}, got {}: {}",
            expected,
            response.status_code(),
            response.text()
        );
    }

    /// Assert a 303 redirect to `location`.
    pub fn assert_redirect(response: &TestResponse, location: &str) {
        assert_status(response, 303);
        let actual = response
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok());
        assert_eq!(actual, Some(location));
    }

    /// `name=value` of a cookie set by the response.
    pub fn set_cookie(response: &TestResponse, name: &str) -> Option<String> {
        let prefix = format!("{}=", name);
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(&prefix))
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }

    /// Assert the body contains `needle`.
    pub fn assert_body_contains(response: &TestResponse, needle: &str) {
        let body = response.text();
        assert!(
            body.contains(needle),
            "Expected body to contain '{}', got: {}",
            needle,
            body
        );
    }
}
