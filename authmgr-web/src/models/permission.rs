/// Auth Manager - Permission model.
///
/// Permissions are a read-only catalog seeded by migrations.
use diesel::prelude::*;
use serde::Serialize;

use crate::schema::permissions;

/// Permission database model.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = permissions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PermissionEntity {
    pub id: i32,
    pub name: String,
}

impl PermissionEntity {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
