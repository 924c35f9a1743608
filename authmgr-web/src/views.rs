/// Auth Manager - View values returned by controllers.
///
/// Controllers never touch HTTP. They return a `ViewResponse` that the web
/// layer renders as an HTML page or turns into a 303 redirect carrying a
/// flash message.
use crate::middleware::flash::{FlashLevel, FlashMessage};
use crate::models::{GroupEntity, PermissionEntity};
use crate::validation::ValidationResults;

/// Outcome of a controller action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewResponse {
    Render(View),
    Redirect(RedirectTo),
}

impl ViewResponse {
    pub fn redirect(
        location: impl Into<String>,
        message: impl Into<String>,
        level: Option<FlashLevel>,
    ) -> Self {
        ViewResponse::Redirect(RedirectTo {
            location: location.into(),
            message: FlashMessage::new(level.unwrap_or_default(), message),
        })
    }
}

/// 303 redirect with a one-time message for the next page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTo {
    pub location: String,
    pub message: FlashMessage,
}

/// Page to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    GroupList(GroupListView),
    GroupForm(GroupFormView),
    GroupRemoveList(GroupRemoveListView),
}

impl View {
    /// Template name, relative to the templates directory, without extension.
    pub fn name(&self) -> &'static str {
        match self {
            View::GroupList(_) => "groups/list",
            View::GroupForm(_) => "groups/form",
            View::GroupRemoveList(_) => "groups/removeList",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupListView {
    pub entities: Vec<GroupEntity>,
    pub current_page: i64,
    pub total_pages: i64,
    pub term: String,
    pub message: Option<FlashMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupFormView {
    pub entity: GroupEntity,
    /// Permission catalog; empty while the group does not exist yet.
    pub permissions: Vec<PermissionEntity>,
    pub validation: ValidationResults,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRemoveListView {
    pub token: String,
    pub entities: Vec<GroupEntity>,
    pub original_url: String,
}
