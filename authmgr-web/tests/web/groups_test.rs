/// Auth Manager - Group Page Tests.
///
/// Drive the group pages end to end against the in-memory store.
use axum::http::header::{COOKIE, REFERER};

use authmgr_web::middleware::flash::FLASH_COOKIE_NAME;

use crate::common::assertions::{
    assert_body_contains, assert_redirect, assert_status, set_cookie,
};
use crate::common::{
    ADMIN_ID, GROUPS_MANAGE_ID, PERMISSIONS_MANAGE_ID, TestApp, USERS_MANAGE_ID, unwrap_some,
};

// =============================================================================
// List
// =============================================================================

#[tokio::test]
async fn test_group_list_empty() {
    let app = TestApp::spawn().await;
    let token = app.csrf_token();

    let response = app
        .server
        .get("/groups/")
        .add_header(COOKIE, app.manager_cookies(&token))
        .await;

    assert_status(&response, 200);
    assert_body_contains(&response, "No groups found.");
    assert_body_contains(&response, "Auth Manager");
}

#[tokio::test]
async fn test_group_list_without_trailing_slash() {
    let app = TestApp::spawn().await;
    app.seed_group("Operators", &[]).await;
    let token = app.csrf_token();

    let response = app
        .server
        .get("/groups")
        .add_header(COOKIE, app.manager_cookies(&token))
        .await;

    assert_status(&response, 200);
    assert_body_contains(&response, "Operators");
}

#[tokio::test]
async fn test_group_list_pagination() {
    let app = TestApp::spawn().await;
    for i in 1..=25 {
        app.seed_group(&format!("group-{:02}", i), &[]).await;
    }
    let token = app.csrf_token();

    let response = app
        .server
        .get("/groups/?page=3")
        .add_header(COOKIE, app.manager_cookies(&token))
        .await;

    assert_status(&response, 200);
    let body = response.text();
    for i in 21..=25 {
        assert!(body.contains(&format!("group-{:02}", i)), "missing group-{}", i);
    }
    assert!(!body.contains("group-20"), "page 3 must start at group-21");
    assert!(body.contains(r#"href="/groups/?page=2">Previous"#));
    assert!(!body.contains(">Next<"));
}

#[tokio::test]
async fn test_group_list_first_page_is_sorted() {
    let app = TestApp::spawn().await;
    for name in ["delta", "alpha", "charlie", "bravo"] {
        app.seed_group(name, &[]).await;
    }
    let token = app.csrf_token();

    let response = app
        .server
        .get("/groups/?page=0")
        .add_header(COOKIE, app.manager_cookies(&token))
        .await;

    assert_status(&response, 200);
    let body = response.text();
    let positions: Vec<usize> = ["alpha", "bravo", "charlie", "delta"]
        .iter()
        .map(|name| unwrap_some!(body.find(&format!(">{}</a>", name))))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{:?}", positions);
}

#[tokio::test]
async fn test_group_list_search_term() {
    let app = TestApp::spawn().await;
    for name in ["Operators", "Dev Ops", "Finance"] {
        app.seed_group(name, &[]).await;
    }
    let token = app.csrf_token();

    let response = app
        .server
        .get("/groups/?term=OPS")
        .add_header(COOKIE, app.manager_cookies(&token))
        .await;

    assert_status(&response, 200);
    assert_body_contains(&response, "Dev Ops");
    let body = response.text();
    assert!(!body.contains("Operators"));
    assert!(!body.contains("Finance"));
    assert!(body.contains(r#"name="term" value="OPS""#));
}

#[tokio::test]
async fn test_group_list_search_wildcards_are_literal() {
    let app = TestApp::spawn().await;
    app.seed_group("ops_team", &[]).await;
    app.seed_group("opsXteam", &[]).await;
    let token = app.csrf_token();

    let response = app
        .server
        .get("/groups/?term=ops_")
        .add_header(COOKIE, app.manager_cookies(&token))
        .await;

    assert_status(&response, 200);
    assert_body_contains(&response, "ops_team");
    assert!(!response.text().contains("opsXteam"));
}

#[tokio::test]
async fn test_group_list_shows_and_clears_flash() {
    let app = TestApp::spawn().await;
    let token = app.csrf_token();

    let created = app
        .server
        .post("/groups/new")
        .add_header(COOKIE, app.manager_cookies(&token))
        .form(&[("name", "Auditors"), ("token", token.as_str())])
        .await;
    assert_redirect(&created, "/groups/");
    let flash = unwrap_some!(set_cookie(&created, FLASH_COOKIE_NAME));

    let response = app
        .server
        .get("/groups/")
        .add_header(COOKIE, format!("{}; {}", app.manager_cookies(&token), flash))
        .await;

    assert_status(&response, 200);
    assert_body_contains(&response, "Group Auditors successfully edited!");
    assert_body_contains(&response, "alert-info");
    let cleared = unwrap_some!(set_cookie(&response, FLASH_COOKIE_NAME));
    assert_eq!(cleared, format!("{}=", FLASH_COOKIE_NAME));
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_new_group_form() {
    let app = TestApp::spawn().await;
    let token = app.csrf_token();

    let response = app
        .server
        .get("/groups/new")
        .add_header(COOKIE, app.manager_cookies(&token))
        .await;

    assert_status(&response, 200);
    assert_body_contains(&response, "New Group");
    // The valid cookie token is reused in the form
    assert_body_contains(&response, &format!(r#"name="token" value="{}""#, token));
    assert!(!response.text().contains("permissionIds[]"));
}

#[tokio::test]
async fn test_create_group() {
    let app = TestApp::spawn().await;
    let token = app.csrf_token();

    let response = app
        .server
        .post("/groups/new")
        .add_header(COOKIE, app.manager_cookies(&token))
        .form(&[("name", "  Release Managers "), ("token", token.as_str())])
        .await;

    assert_redirect(&response, "/groups/");
    let group = unwrap_some!(app.find_group("Release Managers").await);
    assert!(group.id.is_some());
    assert!(group.permission_ids().is_empty());
}

#[tokio::test]
async fn test_create_group_strips_markup() {
    let app = TestApp::spawn().await;
    let token = app.csrf_token();

    let response = app
        .server
        .post("/groups/new")
        .add_header(COOKIE, app.manager_cookies(&token))
        .form(&[("name", "<b>Support</b>"), ("token", token.as_str())])
        .await;

    assert_redirect(&response, "/groups/");
    assert!(app.find_group("Support").await.is_some());
}

#[tokio::test]
async fn test_create_group_keeps_angle_bracket_text() {
    let app = TestApp::spawn().await;
    let token = app.csrf_token();

    let response = app
        .server
        .post("/groups/new")
        .add_header(COOKIE, app.manager_cookies(&token))
        .form(&[("name", "R&D < Ops <i>x</i>"), ("token", token.as_str())])
        .await;

    assert_redirect(&response, "/groups/");
    assert!(app.find_group("R&D < Ops x").await.is_some());
    assert_eq!(app.group_count().await, 1);
}

#[tokio::test]
async fn test_create_group_invalid_token() {
    let app = TestApp::spawn().await;
    let token = app.csrf_token();

    let response = app
        .server
        .post("/groups/new")
        .add_header(COOKIE, app.manager_cookies(&token))
        .form(&[("name", "Auditors"), ("token", "1itfuefduyp9h")])
        .await;

    assert_status(&response, 200);
    assert_body_contains(&response, "Your session has expired, please try again");
    assert_body_contains(&response, r#"value="Auditors""#);
    assert_eq!(app.group_count().await, 0);
}

#[tokio::test]
async fn test_create_group_invalid_token_keeps_field_errors() {
    let app = TestApp::spawn().await;
    let token = app.csrf_token();

    let response = app
        .server
        .post("/groups/new")
        .add_header(COOKIE, app.manager_cookies(&token))
        .form(&[("name", ""), ("token", "")])
        .await;

    assert_status(&response, 200);
    assert_body_contains(&response, "Your session has expired, please try again");
    assert_body_contains(&response, "Name is required");
    assert_eq!(app.group_count().await, 0);
}

#[tokio::test]
async fn test_create_group_duplicate_name() {
    let app = TestApp::spawn().await;
    app.seed_group("Auditors", &[]).await;
    let token = app.csrf_token();

    let response = app
        .server
        .post("/groups/new")
        .add_header(COOKIE, app.manager_cookies(&token))
        .form(&[("name", "Auditors"), ("token", token.as_str())])
        .await;

    assert_status(&response, 200);
    assert_body_contains(
        &response,
        "This name is already registered. Please try another.",
    );
    assert_eq!(app.group_count().await, 1);
}

#[tokio::test]
async fn test_create_group_name_too_long() {
    let app = TestApp::spawn().await;
    let token = app.csrf_token();
    let name = "a".repeat(101);

    let response = app
        .server
        .post("/groups/new")
        .add_header(COOKIE, app.manager_cookies(&token))
        .form(&[("name", name.as_str()), ("token", token.as_str())])
        .await;

    assert_status(&response, 200);
    assert_body_contains(&response, "Name must be 100 characters or fewer");
    assert_eq!(app.group_count().await, 0);
}

// =============================================================================
// Detail
// =============================================================================

#[tokio::test]
async fn test_group_detail() {
    let app = TestApp::spawn().await;
    app.seed_group("Ops Team", &[USERS_MANAGE_ID]).await;
    let token = app.csrf_token();

    let response = app
        .server
        .get("/groups/detail/Ops+Team")
        .add_header(COOKIE, app.manager_cookies(&token))
        .await;

    assert_status(&response, 200);
    assert_body_contains(&response, "Group Ops Team");
    assert_body_contains(&response, r#"action="/groups/update-permissions/Ops+Team""#);
    // Granted permissions are offered for removal, the rest for addition
    assert_body_contains(
        &response,
        &format!(r#"id="remove-{}""#, USERS_MANAGE_ID),
    );
    assert_body_contains(&response, &format!(r#"id="add-{}""#, ADMIN_ID));
    assert!(!response.text().contains(&format!(r#"id="add-{}""#, USERS_MANAGE_ID)));
}

#[tokio::test]
async fn test_group_detail_percent_encoded_space() {
    let app = TestApp::spawn().await;
    app.seed_group("Ops Team", &[]).await;
    let token = app.csrf_token();

    let response = app
        .server
        .get("/groups/detail/Ops%20Team")
        .add_header(COOKIE, app.manager_cookies(&token))
        .await;

    assert_status(&response, 200);
    assert_body_contains(&response, "Group Ops Team");
}

#[tokio::test]
async fn test_group_detail_not_found() {
    let app = TestApp::spawn().await;
    let token = app.csrf_token();

    let response = app
        .server
        .get("/groups/detail/Missing")
        .add_header(COOKIE, app.manager_cookies(&token))
        .await;

    assert_status(&response, 404);
    assert_body_contains(&response, "Group Not Found");
    assert_body_contains(&response, "I could not locate the group Missing.");
    assert_body_contains(&response, r#"href="/groups/""#);
    assert_body_contains(&response, "View All Groups");
}

#[tokio::test]
async fn test_rename_group() {
    let app = TestApp::spawn().await;
    app.seed_group("Ops", &[ADMIN_ID]).await;
    let token = app.csrf_token();

    let response = app
        .server
        .post("/groups/detail/Ops")
        .add_header(COOKIE, app.manager_cookies(&token))
        .form(&[("name", "Operations"), ("token", token.as_str())])
        .await;

    assert_redirect(&response, "/groups/");
    assert!(app.find_group("Ops").await.is_none());
    let renamed = unwrap_some!(app.find_group("Operations").await);
    assert_eq!(renamed.permission_ids(), vec![ADMIN_ID]);
}

#[tokio::test]
async fn test_rename_group_duplicate_posts_back_to_stored_name() {
    let app = TestApp::spawn().await;
    app.seed_group("Ops", &[]).await;
    app.seed_group("Dev", &[]).await;
    let token = app.csrf_token();

    let response = app
        .server
        .post("/groups/detail/Ops")
        .add_header(COOKIE, app.manager_cookies(&token))
        .form(&[("name", "Dev"), ("token", token.as_str())])
        .await;

    assert_status(&response, 200);
    assert_body_contains(
        &response,
        "This name is already registered. Please try another.",
    );
    assert_body_contains(&response, r#"action="/groups/detail/Ops""#);
    assert!(app.find_group("Ops").await.is_some());
}

#[tokio::test]
async fn test_rename_group_invalid_token() {
    let app = TestApp::spawn().await;
    app.seed_group("Ops", &[]).await;
    let token = app.csrf_token();

    let response = app
        .server
        .post("/groups/detail/Ops")
        .add_header(COOKIE, app.manager_cookies(&token))
        .form(&[("name", "Operations"), ("token", "1itfuefduyp9h")])
        .await;

    assert_status(&response, 200);
    assert_body_contains(&response, "Your session has expired, please try again");
    assert!(app.find_group("Ops").await.is_some());
    assert!(app.find_group("Operations").await.is_none());
}

#[tokio::test]
async fn test_rename_missing_group() {
    let app = TestApp::spawn().await;
    let token = app.csrf_token();

    let response = app
        .server
        .post("/groups/detail/Missing")
        .add_header(COOKIE, app.manager_cookies(&token))
        .form(&[("name", "Found"), ("token", token.as_str())])
        .await;

    assert_status(&response, 404);
    assert_eq!(app.group_count().await, 0);
}

// =============================================================================
// Remove
// =============================================================================

#[tokio::test]
async fn test_remove_confirmation() {
    let app = TestApp::spawn().await;
    app.seed_group("Ops", &[]).await;
    app.seed_group("Dev", &[]).await;
    let token = app.csrf_token();

    let response = app
        .server
        .get("/groups/remove?entities%5B%5D=Ops&entities%5B%5D=Missing")
        .add_header(COOKIE, app.manager_cookies(&token))
        .add_header(REFERER, "http://localhost:8080/groups/?page=2")
        .await;

    assert_status(&response, 200);
    assert_body_contains(&response, "<li>Ops</li>");
    assert_body_contains(&response, r#"name="originalUrl" value="/groups/?page=2""#);
    let body = response.text();
    assert!(!body.contains("<li>Dev</li>"));
    assert!(!body.contains(r#"value="Missing""#));
}

#[tokio::test]
async fn test_remove_confirmation_without_referer() {
    let app = TestApp::spawn().await;
    app.seed_group("Ops", &[]).await;
    let token = app.csrf_token();

    let response = app
        .server
        .get("/groups/remove?entities=Ops")
        .add_header(COOKIE, app.manager_cookies(&token))
        .await;

    assert_status(&response, 200);
    assert_body_contains(&response, r#"name="originalUrl" value="/groups/""#);
}

#[tokio::test]
async fn test_remove_groups() {
    let app = TestApp::spawn().await;
    app.seed_group("Ops", &[ADMIN_ID]).await;
    app.seed_group("Dev", &[]).await;
    app.seed_group("Finance", &[]).await;
    let token = app.csrf_token();

    let response = app
        .server
        .post("/groups/remove")
        .add_header(COOKIE, app.manager_cookies(&token))
        .form(&[
            ("entities[]", "Ops"),
            ("entities[]", "Dev"),
            ("originalUrl", "/groups/?page=2"),
            ("token", token.as_str()),
        ])
        .await;

    assert_redirect(&response, "/groups/?page=2");
    assert!(set_cookie(&response, FLASH_COOKIE_NAME).is_some());
    assert_eq!(app.group_count().await, 1);
    assert!(app.find_group("Finance").await.is_some());
}

#[tokio::test]
async fn test_remove_groups_flash_message() {
    let app = TestApp::spawn().await;
    app.seed_group("Ops", &[]).await;
    app.seed_group("Dev", &[]).await;
    let token = app.csrf_token();

    let removed = app
        .server
        .post("/groups/remove")
        .add_header(COOKIE, app.manager_cookies(&token))
        .form(&[
            ("entities[]", "Ops"),
            ("entities[]", "Dev"),
            ("token", token.as_str()),
        ])
        .await;
    assert_redirect(&removed, "/groups/");
    let flash = unwrap_some!(set_cookie(&removed, FLASH_COOKIE_NAME));

    let response = app
        .server
        .get("/groups/")
        .add_header(COOKIE, format!("{}; {}", app.manager_cookies(&token), flash))
        .await;

    assert_body_contains(&response, "Groups successfully removed: Ops, Dev");
    assert_body_contains(&response, "alert-success");
}

#[tokio::test]
async fn test_remove_groups_invalid_token() {
    let app = TestApp::spawn().await;
    app.seed_group("Ops", &[]).await;
    let token = app.csrf_token();

    let response = app
        .server
        .post("/groups/remove")
        .add_header(COOKIE, app.manager_cookies(&token))
        .form(&[
            ("entities[]", "Ops"),
            ("originalUrl", "/groups/?term=ops"),
            ("token", "1itfuefduyp9h"),
        ])
        .await;

    assert_redirect(&response, "/groups/?term=ops");
    assert!(app.find_group("Ops").await.is_some());
}

#[tokio::test]
async fn test_remove_groups_rejects_foreign_return_url() {
    let app = TestApp::spawn().await;
    app.seed_group("Ops", &[]).await;
    let token = app.csrf_token();

    let response = app
        .server
        .post("/groups/remove")
        .add_header(COOKIE, app.manager_cookies(&token))
        .form(&[
            ("entities[]", "Ops"),
            ("originalUrl", "https://evil.example/"),
            ("token", token.as_str()),
        ])
        .await;

    assert_redirect(&response, "/groups/");
    assert_eq!(app.group_count().await, 0);
}

// =============================================================================
// Permissions
// =============================================================================

#[tokio::test]
async fn test_add_permissions() {
    let app = TestApp::spawn().await;
    app.seed_group("Ops Team", &[ADMIN_ID]).await;
    let token = app.csrf_token();
    let groups_manage = GROUPS_MANAGE_ID.to_string();
    let users_manage = USERS_MANAGE_ID.to_string();

    let response = app
        .server
        .post("/groups/update-permissions/Ops+Team")
        .add_header(COOKIE, app.manager_cookies(&token))
        .form(&[
            ("permissionIds[]", groups_manage.as_str()),
            ("permissionIds[]", users_manage.as_str()),
            ("operation", "add"),
            ("token", token.as_str()),
        ])
        .await;

    assert_redirect(&response, "/groups/detail/Ops+Team");
    let group = unwrap_some!(app.find_group("Ops Team").await);
    assert_eq!(
        group.permission_ids(),
        vec![ADMIN_ID, GROUPS_MANAGE_ID, USERS_MANAGE_ID]
    );
}

#[tokio::test]
async fn test_add_permissions_ignores_ids_outside_catalog() {
    let app = TestApp::spawn().await;
    app.seed_group("Ops", &[]).await;
    let token = app.csrf_token();
    let users_manage = USERS_MANAGE_ID.to_string();

    let response = app
        .server
        .post("/groups/update-permissions/Ops")
        .add_header(COOKIE, app.manager_cookies(&token))
        .form(&[
            ("permissionIds[]", users_manage.as_str()),
            ("permissionIds[]", "999"),
            ("operation", "add"),
            ("token", token.as_str()),
        ])
        .await;

    assert_redirect(&response, "/groups/detail/Ops");
    let group = unwrap_some!(app.find_group("Ops").await);
    assert_eq!(group.permission_ids(), vec![USERS_MANAGE_ID]);
}

#[tokio::test]
async fn test_remove_permissions() {
    let app = TestApp::spawn().await;
    app.seed_group("Ops", &[ADMIN_ID, PERMISSIONS_MANAGE_ID, USERS_MANAGE_ID])
        .await;
    let token = app.csrf_token();
    let admin = ADMIN_ID.to_string();
    let users_manage = USERS_MANAGE_ID.to_string();

    let response = app
        .server
        .post("/groups/update-permissions/Ops")
        .add_header(COOKIE, app.manager_cookies(&token))
        .form(&[
            ("permissionIds", admin.as_str()),
            ("permissionIds", users_manage.as_str()),
            ("operation", "remove"),
            ("token", token.as_str()),
        ])
        .await;

    assert_redirect(&response, "/groups/detail/Ops");
    let group = unwrap_some!(app.find_group("Ops").await);
    assert_eq!(group.permission_ids(), vec![PERMISSIONS_MANAGE_ID]);
}

#[tokio::test]
async fn test_update_permissions_invalid_token() {
    let app = TestApp::spawn().await;
    app.seed_group("Ops", &[ADMIN_ID]).await;
    let token = app.csrf_token();
    let users_manage = USERS_MANAGE_ID.to_string();

    let response = app
        .server
        .post("/groups/update-permissions/Ops")
        .add_header(COOKIE, app.manager_cookies(&token))
        .form(&[
            ("permissionIds[]", users_manage.as_str()),
            ("operation", "add"),
            ("token", "1itfuefduyp9h"),
        ])
        .await;

    assert_redirect(&response, "/groups/detail/Ops");
    let group = unwrap_some!(app.find_group("Ops").await);
    assert_eq!(group.permission_ids(), vec![ADMIN_ID]);
}

#[tokio::test]
async fn test_update_permissions_unknown_operation() {
    let app = TestApp::spawn().await;
    app.seed_group("Ops", &[ADMIN_ID]).await;
    let token = app.csrf_token();
    let admin = ADMIN_ID.to_string();

    let response = app
        .server
        .post("/groups/update-permissions/Ops")
        .add_header(COOKIE, app.manager_cookies(&token))
        .form(&[
            ("permissionIds[]", admin.as_str()),
            ("operation", "replace"),
            ("token", token.as_str()),
        ])
        .await;

    assert_redirect(&response, "/groups/detail/Ops");
    let group = unwrap_some!(app.find_group("Ops").await);
    assert_eq!(group.permission_ids(), vec![ADMIN_ID]);
}

#[tokio::test]
async fn test_update_permissions_missing_group() {
    let app = TestApp::spawn().await;
    let token = app.csrf_token();

    let response = app
        .server
        .post("/groups/update-permissions/Missing")
        .add_header(COOKIE, app.manager_cookies(&token))
        .form(&[("operation", "add"), ("token", token.as_str())])
        .await;

    assert_status(&response, 404);
    assert_body_contains(&response, "I could not locate the group Missing.");
}
