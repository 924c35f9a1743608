/// Auth Manager - Persistence of groups and permissions.
///
/// Controllers depend on the traits below. `Storage` selects the backend
/// configured in `storage.backend` and implements both traits by dispatch.
use std::future::Future;
use std::sync::Arc;

use crate::config::{Config, StorageBackend};
use crate::db::{self, DbPool};
use crate::error::AppResult;
use crate::models::{GroupEntity, PermissionEntity};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Group persistence.
pub trait GroupRepository: Send + Sync {
    /// Groups ordered by name.
    fn sorted_list(
        &self,
        limit: i64,
        offset: i64,
    ) -> impl Future<Output = AppResult<Vec<GroupEntity>>> + Send;

    fn count(&self) -> impl Future<Output = AppResult<i64>> + Send;

    /// Groups whose name contains `term`, ignoring case, ordered by name.
    ///
    /// `%`, `_` and `\` in the term match literally.
    fn list_matching_friendly_name(
        &self,
        term: &str,
        limit: i64,
        offset: i64,
    ) -> impl Future<Output = AppResult<Vec<GroupEntity>>> + Send;

    fn count_matching_friendly_name(&self, term: &str)
    -> impl Future<Output = AppResult<i64>> + Send;

    /// Exact name lookup.
    fn by_friendly_name(
        &self,
        name: &str,
    ) -> impl Future<Output = AppResult<Option<GroupEntity>>> + Send;

    /// Groups with the given names. Unknown names are skipped.
    fn list_by_friendly_names(
        &self,
        names: &[String],
    ) -> impl Future<Output = AppResult<Vec<GroupEntity>>> + Send;

    /// Insert or update the group together with its permission set.
    ///
    /// Assigns `group.id` on insert. Fails with `AppError::Duplicate` when
    /// another group already uses the name.
    fn save(&self, group: &mut GroupEntity) -> impl Future<Output = AppResult<()>> + Send;

    /// Delete groups by name, returning how many were removed.
    fn delete_by_friendly_names(
        &self,
        names: &[String],
    ) -> impl Future<Output = AppResult<usize>> + Send;
}

/// Read-only permission catalog.
pub trait PermissionRepository: Send + Sync {
    /// Every permission ordered by name.
    fn all_sorted(&self) -> impl Future<Output = AppResult<Vec<PermissionEntity>>> + Send;
}

/// Configured storage backend.
#[derive(Clone)]
pub enum Storage {
    Postgres(PgStore),
    Memory(Arc<MemoryStore>),
}

impl Storage {
    /// Empty in-memory storage with the default permission catalog.
    pub fn memory() -> Self {
        Storage::Memory(Arc::new(MemoryStore::with_default_permissions()))
    }

    pub fn postgres(pool: DbPool) -> Self {
        Storage::Postgres(PgStore::new(pool))
    }

    /// Check that the backend answers.
    pub async fn ping(&self) -> AppResult<()> {
        match self {
            Storage::Postgres(pg) => db::ping(pg.pool()).await,
            Storage::Memory(_) => Ok(()),
        }
    }
}

/// Create the storage backend selected by configuration.
pub async fn create_storage(config: &Config) -> AppResult<Storage> {
    match config.storage.backend {
        StorageBackend::Postgres => Ok(Storage::postgres(db::create_pool(config).await?)),
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage - data is lost on restart");
            Ok(Storage::memory())
        }
    }
}

impl GroupRepository for Storage {
    async fn sorted_list(&self, limit: i64, offset: i64) -> AppResult<Vec<GroupEntity>> {
        match self {
            Storage::Postgres(pg) => pg.sorted_list(limit, offset).await,
            Storage::Memory(mem) => mem.sorted_list(limit, offset).await,
        }
    }

    async fn count(&self) -> AppResult<i64> {
        match self {
            Storage::Postgres(pg) => pg.count().await,
            Storage::Memory(mem) => mem.count().await,
        }
    }

    async fn list_matching_friendly_name(
        &self,
        term: &str,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<GroupEntity>> {
        match self {
            Storage::Postgres(pg) => pg.list_matching_friendly_name(term, limit, offset).await,
            Storage::Memory(mem) => mem.list_matching_friendly_name(term, limit, offset).await,
        }
    }

    async fn count_matching_friendly_name(&self, term: &str) -> AppResult<i64> {
        match self {
            Storage::Postgres(pg) => pg.count_matching_friendly_name(term).await,
            Storage::Memory(mem) => mem.count_matching_friendly_name(term).await,
        }
    }

    async fn by_friendly_name(&self, name: &str) -> AppResult<Option<GroupEntity>> {
        match self {
            Storage::Postgres(pg) => pg.by_friendly_name(name).await,
            Storage::Memory(mem) => mem.by_friendly_name(name).await,
        }
    }

    async fn list_by_friendly_names(&self, names: &[String]) -> AppResult<Vec<GroupEntity>> {
        match self {
            Storage::Postgres(pg) => pg.list_by_friendly_names(names).await,
            Storage::Memory(mem) => mem.list_by_friendly_names(names).await,
        }
    }

    async fn save(&self, group: &mut GroupEntity) -> AppResult<()> {
        match self {
            Storage::Postgres(pg) => pg.save(group).await,
            Storage::Memory(mem) => mem.save(group).await,
        }
    }

    async fn delete_by_friendly_names(&self, names: &[String]) -> AppResult<usize> {
        match self {
            Storage::Postgres(pg) => pg.delete_by_friendly_names(names).await,
            Storage::Memory(mem) => mem.delete_by_friendly_names(names).await,
        }
    }
}

impl PermissionRepository for Storage {
    async fn all_sorted(&self) -> AppResult<Vec<PermissionEntity>> {
        match self {
            Storage::Postgres(pg) => pg.all_sorted().await,
            Storage::Memory(mem) => mem.all_sorted().await,
        }
    }
}
