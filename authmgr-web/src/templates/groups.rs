/// Auth Manager - Group pages.
use askama::Template;
use url::form_urlencoded;

use crate::controllers::groups::detail_url;
use crate::forms::{GROUP_LIST_URL, encode_name};
use crate::templates::base::LayoutContext;
use crate::views::{GroupFormView, GroupListView, GroupRemoveListView};

/// Group row in the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupListItem {
    pub name: String,
    pub detail_url: String,
    pub permission_count: usize,
}

/// Pagination link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub number: i64,
    pub url: String,
    pub active: bool,
}

/// List URL for `page`, keeping the search term.
pub fn page_url(page: i64, term: &str) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("page", &page.to_string());
    if !term.is_empty() {
        query.append_pair("term", term);
    }
    format!("{}?{}", GROUP_LIST_URL, query.finish())
}

#[derive(Template)]
#[template(path = "groups/list.html")]
pub struct GroupListTemplate {
    pub title: String,
    pub layout: LayoutContext,
    pub groups: Vec<GroupListItem>,
    pub term: String,
    pub current_page: i64,
    pub total_pages: i64,
    pub pages: Vec<PageLink>,
    pub previous_url: Option<String>,
    pub next_url: Option<String>,
}

impl GroupListTemplate {
    pub fn new(view: GroupListView, layout: LayoutContext) -> Self {
        let term = view.term;
        let current_page = view.current_page;
        let total_pages = view.total_pages;

        let pages = (1..=total_pages)
            .map(|number| PageLink {
                number,
                url: page_url(number, &term),
                active: number == current_page,
            })
            .collect();
        let previous_url = (current_page > 1).then(|| page_url(current_page - 1, &term));
        let next_url = (current_page < total_pages).then(|| page_url(current_page + 1, &term));

        let groups = view
            .entities
            .iter()
            .map(|group| GroupListItem {
                name: group.name.clone(),
                detail_url: detail_url(&group.name),
                permission_count: group.permission_ids().len(),
            })
            .collect();

        Self {
            title: "Groups".to_string(),
            layout: layout.with_message(view.message.as_ref()),
            groups,
            term,
            current_page,
            total_pages,
            pages,
            previous_url,
            next_url,
        }
    }
}

/// Permission checkbox on the group form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionOption {
    pub id: i32,
    pub name: String,
    pub granted: bool,
}

#[derive(Template)]
#[template(path = "groups/form.html")]
pub struct GroupFormTemplate {
    pub title: String,
    pub layout: LayoutContext,
    pub is_new: bool,
    pub name: String,
    pub token: String,
    pub name_errors: Vec<String>,
    pub form_errors: Vec<String>,
    pub permissions: Vec<PermissionOption>,
    /// Target of the permission forms; set once the group exists.
    pub update_permissions_url: Option<String>,
}

impl GroupFormTemplate {
    /// `stored_name` is the name the group is persisted under, which differs
    /// from the form value while a rename is being corrected.
    pub fn new(view: GroupFormView, layout: LayoutContext, stored_name: Option<&str>) -> Self {
        let is_new = view.entity.is_new();
        let permissions = view
            .permissions
            .iter()
            .map(|p| PermissionOption {
                id: p.id,
                name: p.name.clone(),
                granted: view.entity.has_permission(p.id),
            })
            .collect();
        let update_permissions_url = stored_name
            .filter(|_| !is_new)
            .map(|name| format!("/groups/update-permissions/{}", encode_name(name)));

        Self {
            title: if is_new {
                "New Group".to_string()
            } else {
                format!("Group {}", stored_name.unwrap_or(&view.entity.name))
            },
            layout,
            is_new,
            name_errors: view.validation.errors_for_field("name").to_vec(),
            form_errors: view.validation.errors_for_field("form").to_vec(),
            name: view.entity.name,
            token: view.token,
            permissions,
            update_permissions_url,
        }
    }
}

#[derive(Template)]
#[template(path = "groups/remove_list.html")]
pub struct GroupRemoveListTemplate {
    pub title: String,
    pub layout: LayoutContext,
    pub token: String,
    pub names: Vec<String>,
    pub original_url: String,
}

impl GroupRemoveListTemplate {
    pub fn new(view: GroupRemoveListView, layout: LayoutContext) -> Self {
        Self {
            title: "Remove Groups".to_string(),
            layout,
            token: view.token,
            names: view.entities.into_iter().map(|g| g.name).collect(),
            original_url: view.original_url,
        }
    }
}
