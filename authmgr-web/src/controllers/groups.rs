/// Auth Manager - Group management controller.
///
/// Lists, creates, edits and removes groups and updates their permission
/// sets. Every action first checks that the user may manage groups.
use crate::error::{AppError, AppResult, ContentNotFound};
use crate::forms::{GROUP_LIST_URL, GroupForm, PermissionUpdateForm, RemoveForm, encode_name};
use crate::middleware::flash::{FlashLevel, FlashMessage};
use crate::models::{GroupEntity, PermissionEntity};
use crate::repository::{GroupRepository, PermissionRepository};
use crate::services::{CsrfService, PermissionGuard};
use crate::validation::{GroupValidation, ValidationResults};
use crate::views::{GroupFormView, GroupListView, GroupRemoveListView, View, ViewResponse};

/// Groups per list page.
pub const PAGE_SIZE: i64 = 10;

/// Permission required for every group action.
pub const MANAGE_GROUPS: &str = "groups.manage";

pub const MSG_SESSION_EXPIRED: &str = "Your session has expired, please try again";
pub const MSG_SESSION_EXPIRED_REMOVE: &str =
    "Your session has expired, please try deleting those groups again";
pub const MSG_SESSION_EXPIRED_PERMISSIONS: &str =
    "Your session has expired, please try updating permissions again";
pub const MSG_DUPLICATE_NAME: &str = "This name is already registered. Please try another.";
pub const MSG_PERMISSIONS_UPDATED: &str = "Your permissions have been updated";

/// Number of pages needed for `count` groups.
pub fn total_pages(count: i64) -> i64 {
    if count <= 0 {
        return 0;
    }
    (count + PAGE_SIZE - 1) / PAGE_SIZE
}

/// Repository offset of the first group on `page` (pages start at 1).
pub fn page_offset(page: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(PAGE_SIZE)
}

/// Detail page of a group.
pub fn detail_url(name: &str) -> String {
    format!("/groups/detail/{}", encode_name(name))
}

fn group_not_found(name: &str) -> AppError {
    AppError::NotFound(ContentNotFound::new(
        "Group Not Found",
        format!("I could not locate the group {}.", name),
        GROUP_LIST_URL,
        "View All Groups",
    ))
}

/// Group controller, generic over its collaborators.
pub struct GroupController<'a, G, P, V, C, A> {
    groups: &'a G,
    permissions: &'a P,
    validation: &'a V,
    csrf: &'a C,
    guard: &'a A,
}

impl<'a, G, P, V, C, A> GroupController<'a, G, P, V, C, A>
where
    G: GroupRepository,
    P: PermissionRepository,
    V: GroupValidation,
    C: CsrfService,
    A: PermissionGuard,
{
    pub fn new(
        groups: &'a G,
        permissions: &'a P,
        validation: &'a V,
        csrf: &'a C,
        guard: &'a A,
    ) -> Self {
        Self {
            groups,
            permissions,
            validation,
            csrf,
            guard,
        }
    }

    /// Refuse the action unless the user may manage groups.
    pub fn check_for_permission(&self) -> AppResult<()> {
        if self.guard.check_for_permission(MANAGE_GROUPS) {
            Ok(())
        } else {
            tracing::warn!(permission = MANAGE_GROUPS, "Group action refused");
            Err(AppError::Authorization(
                "You do not have permission to manage groups".to_string(),
            ))
        }
    }

    /// One page of groups, filtered by `term` when it is not empty.
    pub async fn get_list(
        &self,
        page: i64,
        term: &str,
        pending_message: Option<FlashMessage>,
    ) -> AppResult<ViewResponse> {
        self.check_for_permission()?;

        let current_page = page.max(1);
        let offset = page_offset(current_page);

        let (entities, count) = if term.is_empty() {
            (
                self.groups.sorted_list(PAGE_SIZE, offset).await?,
                self.groups.count().await?,
            )
        } else {
            (
                self.groups
                    .list_matching_friendly_name(term, PAGE_SIZE, offset)
                    .await?,
                self.groups.count_matching_friendly_name(term).await?,
            )
        };

        Ok(ViewResponse::Render(View::GroupList(GroupListView {
            entities,
            current_page,
            total_pages: total_pages(count),
            term: term.to_string(),
            message: pending_message,
        })))
    }

    /// Empty form for a new group.
    pub async fn get_new(&self) -> AppResult<ViewResponse> {
        self.check_for_permission()?;
        Ok(self.render_form(
            GroupEntity::default(),
            Vec::new(),
            ValidationResults::new(),
        ))
    }

    /// Create a group.
    pub async fn post_new(&self, form: GroupForm) -> AppResult<ViewResponse> {
        self.check_for_permission()?;
        let entity = GroupEntity::from_name(form.name);
        self.save_from_form(entity, &form.token, Vec::new()).await
    }

    /// Edit form for an existing group.
    pub async fn get_detail(&self, name: &str) -> AppResult<ViewResponse> {
        self.check_for_permission()?;
        let entity = self.load(name).await?;
        let permissions = self.permissions.all_sorted().await?;
        Ok(self.render_form(entity, permissions, ValidationResults::new()))
    }

    /// Rename an existing group.
    pub async fn post_detail(&self, name: &str, form: GroupForm) -> AppResult<ViewResponse> {
        self.check_for_permission()?;
        let mut entity = self.load(name).await?;
        entity.name = form.name;
        let permissions = self.permissions.all_sorted().await?;
        self.save_from_form(entity, &form.token, permissions).await
    }

    /// Confirmation page for removing the selected groups.
    pub async fn get_remove(&self, form: RemoveForm, referer: String) -> AppResult<ViewResponse> {
        self.check_for_permission()?;
        let entities = self.groups.list_by_friendly_names(&form.entities).await?;
        Ok(ViewResponse::Render(View::GroupRemoveList(
            GroupRemoveListView {
                token: self.csrf.new_token(),
                entities,
                original_url: referer,
            },
        )))
    }

    /// Remove the selected groups and return to where the user came from.
    pub async fn post_remove(&self, form: RemoveForm) -> AppResult<ViewResponse> {
        self.check_for_permission()?;
        let return_url = form.return_url();

        if !self.csrf.validate_token(&form.token) {
            tracing::warn!("CSRF token rejected on group removal");
            return Ok(ViewResponse::redirect(
                return_url,
                MSG_SESSION_EXPIRED_REMOVE,
                Some(FlashLevel::Danger),
            ));
        }

        let deleted = self.groups.delete_by_friendly_names(&form.entities).await?;
        tracing::info!(requested = form.entities.len(), deleted, "Groups removed");

        Ok(ViewResponse::redirect(
            return_url,
            format!("Groups successfully removed: {}", form.entities.join(", ")),
            Some(FlashLevel::Success),
        ))
    }

    /// Add or remove permissions of a group.
    pub async fn post_update_permissions(
        &self,
        name: &str,
        form: PermissionUpdateForm,
    ) -> AppResult<ViewResponse> {
        self.check_for_permission()?;
        let mut entity = self.load(name).await?;
        let location = detail_url(&entity.name);

        if !self.csrf.validate_token(&form.token) {
            tracing::warn!(group = %entity.name, "CSRF token rejected on permission update");
            return Ok(ViewResponse::redirect(
                location,
                MSG_SESSION_EXPIRED_PERMISSIONS,
                Some(FlashLevel::Danger),
            ));
        }

        match form.operation.as_str() {
            "add" => {
                let catalog = self.permissions.all_sorted().await?;
                let known: Vec<i32> = form
                    .permission_ids
                    .iter()
                    .copied()
                    .filter(|id| catalog.iter().any(|p| p.id == *id))
                    .collect();
                if known.len() < form.permission_ids.len() {
                    tracing::debug!(
                        requested = ?form.permission_ids,
                        "Unknown permission ids ignored"
                    );
                }
                entity.add_permissions(&known);
            }
            "remove" => entity.remove_permissions(&form.permission_ids),
            other => tracing::debug!(operation = other, "Unknown permission operation ignored"),
        }

        self.groups.save(&mut entity).await?;
        tracing::info!(
            group = %entity.name,
            operation = %form.operation,
            permissions = ?entity.permission_ids(),
            "Group permissions updated"
        );

        Ok(ViewResponse::redirect(
            location,
            MSG_PERMISSIONS_UPDATED,
            Some(FlashLevel::Success),
        ))
    }

    async fn load(&self, name: &str) -> AppResult<GroupEntity> {
        self.groups
            .by_friendly_name(name)
            .await?
            .ok_or_else(|| group_not_found(name))
    }

    fn render_form(
        &self,
        entity: GroupEntity,
        permissions: Vec<PermissionEntity>,
        validation: ValidationResults,
    ) -> ViewResponse {
        ViewResponse::Render(View::GroupForm(GroupFormView {
            entity,
            permissions,
            validation,
            token: self.csrf.new_token(),
        }))
    }

    /// Check the token, validate, then save; re-render the form on any failure.
    async fn save_from_form(
        &self,
        mut entity: GroupEntity,
        token: &str,
        permissions: Vec<PermissionEntity>,
    ) -> AppResult<ViewResponse> {
        let token_valid = self.csrf.validate_token(token);
        let mut validation = self.validation.validate(&entity);

        if !token_valid {
            tracing::warn!(group = %entity.name, "CSRF token rejected on group form");
            validation.add_error("form", MSG_SESSION_EXPIRED);
        }
        if !validation.is_valid() {
            return Ok(self.render_form(entity, permissions, validation));
        }

        match self.groups.save(&mut entity).await {
            Ok(()) => {
                tracing::info!(group = %entity.name, id = ?entity.id, "Group saved");
                Ok(ViewResponse::redirect(
                    GROUP_LIST_URL,
                    format!("Group {} successfully edited!", entity.name),
                    None,
                ))
            }
            Err(AppError::Duplicate { field }) => {
                validation.add_error(field, MSG_DUPLICATE_NAME);
                Ok(self.render_form(entity, permissions, validation))
            }
            Err(e) => {
                tracing::error!(group = %entity.name, "Failed to save group: {}", e);
                Err(e)
            }
        }
    }
}
