/// Auth Manager - Group model.
///
/// A group is a named set of permissions. The name is the friendly,
/// user-editable identifier used in URLs.
use std::collections::BTreeSet;

use diesel::prelude::*;
use serde::Serialize;

use crate::schema::{group_permissions, groups};

/// Group entity as handled by controllers and templates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupEntity {
    /// Assigned by the repository on first save.
    pub id: Option<i32>,
    pub name: String,
    permission_ids: BTreeSet<i32>,
}

impl GroupEntity {
    /// Unsaved group with no permissions.
    pub fn from_name(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            permission_ids: BTreeSet::new(),
        }
    }

    /// Rebuild a persisted group.
    pub fn with_permissions(
        id: i32,
        name: impl Into<String>,
        permission_ids: impl IntoIterator<Item = i32>,
    ) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
            permission_ids: permission_ids.into_iter().collect(),
        }
    }

    /// Permission ids in ascending order.
    pub fn permission_ids(&self) -> Vec<i32> {
        self.permission_ids.iter().copied().collect()
    }

    pub fn has_permission(&self, permission_id: i32) -> bool {
        self.permission_ids.contains(&permission_id)
    }

    /// Union the given ids into the group's permissions.
    pub fn add_permissions(&mut self, ids: &[i32]) {
        self.permission_ids.extend(ids.iter().copied());
    }

    /// Remove the given ids from the group's permissions.
    pub fn remove_permissions(&mut self, ids: &[i32]) {
        for id in ids {
            self.permission_ids.remove(id);
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }
}

/// Group database row.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = groups)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GroupRow {
    pub id: i32,
    pub name: String,
}

/// New group for insertion.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = groups)]
pub struct NewGroup<'a> {
    pub name: &'a str,
}

/// Link between a group and one of its permissions.
#[derive(Debug, Clone, Copy, Queryable, Selectable, Insertable)]
#[diesel(table_name = group_permissions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GroupPermission {
    pub group_id: i32,
    pub permission_id: i32,
}
