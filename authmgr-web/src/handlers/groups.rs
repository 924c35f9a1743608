/// Auth Manager - Group page handlers.
use askama::Template;
use axum::{
    body::Bytes,
    extract::{FromRequestParts, Query, State},
    http::{HeaderMap, Uri, header::REFERER, request::Parts},
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::AppState;
use crate::controllers::groups::GroupController;
use crate::error::{AppError, AppResult, render_not_found};
use crate::forms::{GroupForm, PermissionUpdateForm, RemoveForm, decode_name, referer_path};
use crate::middleware::auth::{AuthUser, WebAuthUser};
use crate::middleware::flash::{IncomingFlash, flash_redirect};
use crate::repository::Storage;
use crate::services::{CookieCsrf, CsrfService};
use crate::templates::{
    GroupFormTemplate, GroupListTemplate, GroupRemoveListTemplate, LayoutContext, UserContext,
};
use crate::validation::GroupRules;
use crate::views::{RedirectTo, View, ViewResponse};

type WebGroupController<'a> =
    GroupController<'a, Storage, Storage, GroupRules, CookieCsrf, AuthUser>;

/// Request context of a group page: the signed-in user, their CSRF token,
/// pending flash messages and the layout around the page.
pub struct GroupPage {
    user: AuthUser,
    layout: LayoutContext,
    csrf: CookieCsrf,
    jar: CookieJar,
    flash: IncomingFlash,
    secure_cookies: bool,
}

impl FromRequestParts<AppState> for GroupPage {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let WebAuthUser(user) = WebAuthUser::from_request_parts(parts, state).await?;
        let flash = match IncomingFlash::from_request_parts(parts, state).await {
            Ok(flash) => flash,
            Err(never) => match never {},
        };
        let jar = CookieJar::from_headers(&parts.headers);
        let csrf = CookieCsrf::from_jar(state.config.signing_key(), &jar);

        let current_url = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());
        let layout = LayoutContext::new(
            Some(UserContext::from(&user)),
            current_url,
            state.config.security.login_url.clone(),
        )
        .with_csrf_token(csrf.new_token());

        Ok(Self {
            user,
            layout,
            csrf,
            jar,
            flash,
            secure_cookies: state.config.security.secure_cookies,
        })
    }
}

impl GroupPage {
    fn controller<'a>(&'a self, storage: &'a Storage) -> WebGroupController<'a> {
        GroupController::new(storage, storage, &GroupRules, &self.csrf, &self.user)
    }

    /// Turn a controller outcome into the HTTP response.
    ///
    /// `stored_name` is the group named in the path, if any.
    fn respond(self, result: AppResult<ViewResponse>, stored_name: Option<&str>) -> Response {
        match result {
            Ok(ViewResponse::Render(view)) => self.render(view, stored_name),
            Ok(ViewResponse::Redirect(RedirectTo { location, message })) => {
                flash_redirect(self.flash.flash().push(message), &location)
            }
            Err(AppError::NotFound(not_found)) => {
                tracing::debug!(%not_found, "Group page not found");
                let jar = self.csrf.attach(self.jar, self.secure_cookies);
                (jar, render_not_found(&not_found, self.layout)).into_response()
            }
            Err(e) => e.into_response(),
        }
    }

    fn render(self, view: View, stored_name: Option<&str>) -> Response {
        let Self {
            layout,
            csrf,
            jar,
            flash,
            secure_cookies,
            ..
        } = self;

        let view_name = view.name();
        let pending = flash.pending();
        let rendered = match view {
            View::GroupList(list) => GroupListTemplate::new(list, layout).render(),
            View::GroupForm(form) => GroupFormTemplate::new(
                form,
                layout.with_message(pending.as_ref()),
                stored_name,
            )
            .render(),
            View::GroupRemoveList(remove) => {
                GroupRemoveListTemplate::new(remove, layout.with_message(pending.as_ref()))
                    .render()
            }
        };

        match rendered {
            Ok(html) => (csrf.attach(jar, secure_cookies), flash.clear(), Html(html)).into_response(),
            Err(e) => {
                tracing::error!(view = view_name, "Template render error: {}", e);
                AppError::Internal(e.into()).into_response()
            }
        }
    }
}

/// Query string of the group list.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub term: Option<String>,
}

impl ListQuery {
    /// Requested page; missing or malformed values mean page 1.
    pub fn page(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(1)
    }

    pub fn term(&self) -> &str {
        self.term.as_deref().map(str::trim).unwrap_or_default()
    }
}

/// Group name from the last path segment; `+` and `%20` both mean a space.
///
/// Read from the raw URI so that `%2B` stays a literal `+`.
fn path_name(uri: &Uri) -> String {
    decode_name(uri.path().rsplit('/').next().unwrap_or_default())
}

/// Group list, optionally filtered.
pub async fn group_list(
    State(state): State<AppState>,
    page: GroupPage,
    Query(query): Query<ListQuery>,
) -> Response {
    let result = page
        .controller(&state.storage)
        .get_list(query.page(), query.term(), page.flash.pending())
        .await;
    page.respond(result, None)
}

/// Empty group form.
pub async fn group_new(State(state): State<AppState>, page: GroupPage) -> Response {
    let result = page.controller(&state.storage).get_new().await;
    page.respond(result, None)
}

/// Create a group.
pub async fn group_create(State(state): State<AppState>, page: GroupPage, body: Bytes) -> Response {
    let form = GroupForm::from_bytes(&body);
    let result = page.controller(&state.storage).post_new(form).await;
    page.respond(result, None)
}

/// Group edit form.
pub async fn group_detail(
    State(state): State<AppState>,
    uri: Uri,
    page: GroupPage,
) -> Response {
    let name = path_name(&uri);
    let result = page.controller(&state.storage).get_detail(&name).await;
    page.respond(result, Some(&name))
}

/// Rename a group.
pub async fn group_update(
    State(state): State<AppState>,
    uri: Uri,
    page: GroupPage,
    body: Bytes,
) -> Response {
    let name = path_name(&uri);
    let form = GroupForm::from_bytes(&body);
    let result = page.controller(&state.storage).post_detail(&name, form).await;
    page.respond(result, Some(&name))
}

/// Confirmation page listing the groups selected for removal.
pub async fn group_remove_confirm(
    State(state): State<AppState>,
    page: GroupPage,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let form = RemoveForm::from_bytes(uri.query().unwrap_or_default().as_bytes());
    let referer = referer_path(headers.get(REFERER).and_then(|v| v.to_str().ok()));
    let result = page
        .controller(&state.storage)
        .get_remove(form, referer)
        .await;
    page.respond(result, None)
}

/// Remove the selected groups.
pub async fn group_remove(State(state): State<AppState>, page: GroupPage, body: Bytes) -> Response {
    let form = RemoveForm::from_bytes(&body);
    let result = page.controller(&state.storage).post_remove(form).await;
    page.respond(result, None)
}

/// Add or remove permissions of a group.
pub async fn group_update_permissions(
    State(state): State<AppState>,
    uri: Uri,
    page: GroupPage,
    body: Bytes,
) -> Response {
    let name = path_name(&uri);
    let form = PermissionUpdateForm::from_bytes(&body);
    let result = page
        .controller(&state.storage)
        .post_update_permissions(&name, form)
        .await;
    page.respond(result, Some(&name))
}
