/// Auth Manager - In-memory repositories.
///
/// Used with `storage.backend = "memory"` for development and integration
/// tests. Same ordering and matching rules as the PostgreSQL store.
use std::collections::BTreeMap;

use tokio::sync::RwLock;

use super::{GroupRepository, PermissionRepository};
use crate::error::{AppError, AppResult};
use crate::models::{GroupEntity, PermissionEntity};

/// Permissions seeded by the initial migration.
pub const DEFAULT_PERMISSIONS: [&str; 4] =
    ["admin", "groups.manage", "permissions.manage", "users.manage"];

#[derive(Debug)]
struct MemoryState {
    groups: BTreeMap<i32, GroupEntity>,
    permissions: Vec<PermissionEntity>,
    next_group_id: i32,
}

impl MemoryState {
    fn sorted_groups(&self, keep: impl Fn(&GroupEntity) -> bool) -> Vec<&GroupEntity> {
        let mut groups: Vec<&GroupEntity> = self.groups.values().filter(|g| keep(*g)).collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        groups
    }
}

/// Process-local store behind a tokio `RwLock`.
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Store with the given permission catalog and no groups.
    pub fn with_permissions<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let permissions = names
            .into_iter()
            .zip(1..)
            .map(|(name, id)| PermissionEntity::new(id, name))
            .collect();
        Self {
            state: RwLock::new(MemoryState {
                groups: BTreeMap::new(),
                permissions,
                next_group_id: 1,
            }),
        }
    }

    pub fn with_default_permissions() -> Self {
        Self::with_permissions(DEFAULT_PERMISSIONS)
    }
}

fn matches_term(group: &GroupEntity, term: &str) -> bool {
    group.name.to_lowercase().contains(&term.to_lowercase())
}

fn page(groups: Vec<&GroupEntity>, limit: i64, offset: i64) -> Vec<GroupEntity> {
    let offset = usize::try_from(offset).unwrap_or(0);
    let limit = usize::try_from(limit).unwrap_or(0);
    groups.into_iter().skip(offset).take(limit).cloned().collect()
}

fn to_count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

impl GroupRepository for MemoryStore {
    async fn sorted_list(&self, limit: i64, offset: i64) -> AppResult<Vec<GroupEntity>> {
        let state = self.state.read().await;
        Ok(page(state.sorted_groups(|_| true), limit, offset))
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(to_count(self.state.read().await.groups.len()))
    }

    async fn list_matching_friendly_name(
        &self,
        term: &str,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<GroupEntity>> {
        let state = self.state.read().await;
        Ok(page(
            state.sorted_groups(|g| matches_term(g, term)),
            limit,
            offset,
        ))
    }

    async fn count_matching_friendly_name(&self, term: &str) -> AppResult<i64> {
        let state = self.state.read().await;
        Ok(to_count(
            state.groups.values().filter(|g| matches_term(g, term)).count(),
        ))
    }

    async fn by_friendly_name(&self, name: &str) -> AppResult<Option<GroupEntity>> {
        let state = self.state.read().await;
        Ok(state.groups.values().find(|g| g.name == name).cloned())
    }

    async fn list_by_friendly_names(&self, names: &[String]) -> AppResult<Vec<GroupEntity>> {
        let state = self.state.read().await;
        Ok(state
            .sorted_groups(|g| names.contains(&g.name))
            .into_iter()
            .cloned()
            .collect())
    }

    async fn save(&self, group: &mut GroupEntity) -> AppResult<()> {
        let mut state = self.state.write().await;

        let taken = state
            .groups
            .values()
            .any(|g| g.name == group.name && g.id != group.id);
        if taken {
            return Err(AppError::duplicate("name"));
        }

        let id = match group.id {
            Some(id) if state.groups.contains_key(&id) => id,
            Some(id) => {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "Group {} no longer exists",
                    id
                )));
            }
            None => {
                let id = state.next_group_id;
                state.next_group_id += 1;
                id
            }
        };

        group.id = Some(id);
        state.groups.insert(id, group.clone());
        Ok(())
    }

    async fn delete_by_friendly_names(&self, names: &[String]) -> AppResult<usize> {
        let mut state = self.state.write().await;
        let before = state.groups.len();
        state.groups.retain(|_, g| !names.contains(&g.name));
        Ok(before - state.groups.len())
    }
}

impl PermissionRepository for MemoryStore {
    async fn all_sorted(&self) -> AppResult<Vec<PermissionEntity>> {
        let state = self.state.read().await;
        let mut permissions = state.permissions.clone();
        permissions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(permissions)
    }
}
