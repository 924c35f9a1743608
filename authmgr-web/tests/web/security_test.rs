/// Auth Manager - Security Tests.
///
/// Session handling, the permission guard, CSRF cookie issuance and
/// response headers.
use axum::http::header::COOKIE;

use authmgr_web::middleware::csrf::CSRF_COOKIE_NAME;
use authmgr_web::services::session::{SESSION_COOKIE_NAME, SessionClaims, encode_session};

use crate::common::TestApp;
use crate::common::assertions::{
    assert_body_contains, assert_redirect, assert_status, set_cookie,
};
use crate::common::{unwrap_ok, unwrap_some};

// =============================================================================
// Sessions
// =============================================================================

#[tokio::test]
async fn test_group_pages_redirect_to_login_without_session() {
    let app = TestApp::spawn().await;

    for path in ["/groups/", "/groups/new", "/groups/detail/Ops", "/groups/remove"] {
        let response = app.server.get(path).await;
        assert_redirect(&response, "/auth/login");
    }
}

#[tokio::test]
async fn test_post_without_session_redirects_and_keeps_data() {
    let app = TestApp::spawn().await;
    app.seed_group("Ops", &[]).await;

    let response = app
        .server
        .post("/groups/remove")
        .form(&[("entities[]", "Ops"), ("token", "1itfuefduyp9h")])
        .await;

    assert_redirect(&response, "/auth/login");
    assert!(app.find_group("Ops").await.is_some());
}

#[tokio::test]
async fn test_forged_session_is_ignored() {
    let app = TestApp::spawn().await;
    let claims = SessionClaims::new(
        "mallory",
        vec!["admin".to_string()],
        time::Duration::hours(1),
    );
    let forged = unwrap_ok!(encode_session(b"some-other-secret", &claims));

    let response = app
        .server
        .get("/groups/")
        .add_header(COOKIE, format!("{}={}", SESSION_COOKIE_NAME, forged))
        .await;

    assert_redirect(&response, "/auth/login");
}

#[tokio::test]
async fn test_expired_session_is_ignored() {
    let app = TestApp::spawn().await;
    let claims = SessionClaims::new(
        "manager",
        vec!["groups.manage".to_string()],
        time::Duration::minutes(-5),
    );
    let expired = unwrap_ok!(encode_session(app.state.config.signing_key(), &claims));

    let response = app
        .server
        .get("/groups/")
        .add_header(COOKIE, format!("{}={}", SESSION_COOKIE_NAME, expired))
        .await;

    assert_redirect(&response, "/auth/login");
}

#[tokio::test]
async fn test_logout_clears_session() {
    let app = TestApp::spawn().await;
    let token = app.csrf_token();

    let response = app
        .server
        .post("/auth/logout")
        .add_header(COOKIE, app.manager_cookies(&token))
        .form(&[("originalUrl", "/groups/?page=2"), ("token", token.as_str())])
        .await;

    assert_redirect(&response, "/groups/?page=2");
    let cleared = unwrap_some!(set_cookie(&response, SESSION_COOKIE_NAME));
    assert_eq!(cleared, format!("{}=", SESSION_COOKIE_NAME));
}

#[tokio::test]
async fn test_logout_without_token_keeps_session() {
    let app = TestApp::spawn().await;
    let token = app.csrf_token();

    let response = app
        .server
        .post("/auth/logout")
        .add_header(COOKIE, app.manager_cookies(&token))
        .form(&[("originalUrl", "/groups/")])
        .await;

    assert_redirect(&response, "/groups/");
    assert!(set_cookie(&response, SESSION_COOKIE_NAME).is_none());
}

#[tokio::test]
async fn test_logout_form_carries_csrf_token() {
    let app = TestApp::spawn().await;
    let token = app.csrf_token();

    let response = app
        .server
        .get("/groups/")
        .add_header(COOKIE, app.manager_cookies(&token))
        .await;

    assert_status(&response, 200);
    assert_body_contains(&response, r#"action="/auth/logout""#);
    assert_body_contains(&response, &format!(r#"name="token" value="{}""#, token));
}

// =============================================================================
// Permission guard
// =============================================================================

#[tokio::test]
async fn test_group_pages_require_manage_permission() {
    let app = TestApp::spawn().await;
    let session = app.session("viewer", &["users.manage"]);

    let response = app
        .server
        .get("/groups/")
        .add_header(COOKIE, format!("{}={}", SESSION_COOKIE_NAME, session))
        .await;

    assert_status(&response, 403);
}

#[tokio::test]
async fn test_refused_post_has_no_side_effects() {
    let app = TestApp::spawn().await;
    app.seed_group("Ops", &[]).await;
    let token = app.csrf_token();
    let session = app.session("viewer", &[]);

    let response = app
        .server
        .post("/groups/remove")
        .add_header(
            COOKIE,
            format!(
                "{}={}; {}={}",
                SESSION_COOKIE_NAME, session, CSRF_COOKIE_NAME, token
            ),
        )
        .form(&[("entities[]", "Ops"), ("token", token.as_str())])
        .await;

    assert_status(&response, 403);
    assert!(app.find_group("Ops").await.is_some());
}

#[tokio::test]
async fn test_admin_may_manage_groups() {
    let app = TestApp::spawn().await;
    let session = app.session("root", &["admin"]);

    let response = app
        .server
        .get("/groups/")
        .add_header(COOKIE, format!("{}={}", SESSION_COOKIE_NAME, session))
        .await;

    assert_status(&response, 200);
    assert_body_contains(&response, "root");
    assert_body_contains(&response, "Logout");
}

// =============================================================================
// CSRF cookie
// =============================================================================

#[tokio::test]
async fn test_form_token_matches_issued_cookie() {
    let app = TestApp::spawn().await;
    let session = app.session("manager", &["groups.manage"]);

    let response = app
        .server
        .get("/groups/new")
        .add_header(COOKIE, format!("{}={}", SESSION_COOKIE_NAME, session))
        .await;

    assert_status(&response, 200);
    let cookie = unwrap_some!(set_cookie(&response, CSRF_COOKIE_NAME));
    let token = unwrap_some!(cookie.strip_prefix(&format!("{}=", CSRF_COOKIE_NAME)));
    assert_body_contains(&response, &format!(r#"name="token" value="{}""#, token));

    // Exactly one CSRF cookie, the handler's
    let csrf_cookies = response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter(|v| v.to_str().unwrap_or_default().starts_with(CSRF_COOKIE_NAME))
        .count();
    assert_eq!(csrf_cookies, 1);
}

#[tokio::test]
async fn test_issued_token_is_accepted() {
    let app = TestApp::spawn().await;
    let session = app.session("manager", &["groups.manage"]);

    let form_page = app
        .server
        .get("/groups/new")
        .add_header(COOKIE, format!("{}={}", SESSION_COOKIE_NAME, session))
        .await;
    let cookie = unwrap_some!(set_cookie(&form_page, CSRF_COOKIE_NAME));
    let token = unwrap_some!(cookie.strip_prefix(&format!("{}=", CSRF_COOKIE_NAME))).to_string();

    let response = app
        .server
        .post("/groups/new")
        .add_header(
            COOKIE,
            format!("{}={}; {}", SESSION_COOKIE_NAME, session, cookie),
        )
        .form(&[("name", "Auditors"), ("token", token.as_str())])
        .await;

    assert_redirect(&response, "/groups/");
    assert!(app.find_group("Auditors").await.is_some());
}

#[tokio::test]
async fn test_csrf_cookie_issued_on_redirects() {
    let app = TestApp::spawn().await;

    let response = app.server.get("/").await;

    assert_redirect(&response, "/groups/");
    assert!(set_cookie(&response, CSRF_COOKIE_NAME).is_some());
}

// =============================================================================
// Headers and health
// =============================================================================

#[tokio::test]
async fn test_security_headers_present() {
    let app = TestApp::spawn().await;

    let response = app.server.get("/health").await;

    let headers = response.headers();
    assert_eq!(
        headers.get("x-content-type-options").and_then(|v| v.to_str().ok()),
        Some("nosniff")
    );
    assert_eq!(
        headers.get("x-frame-options").and_then(|v| v.to_str().ok()),
        Some("DENY")
    );
    assert!(headers.contains_key("content-security-policy"));
    assert_eq!(
        headers.get("referrer-policy").and_then(|v| v.to_str().ok()),
        Some("same-origin")
    );
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::spawn().await;

    let response = app.server.get("/health").await;

    assert_status(&response, 200);
    assert_eq!(response.text(), "OK");
}
