/// Auth Manager - PostgreSQL repositories.
use std::collections::HashMap;

use diesel::prelude::*;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use super::{GroupRepository, PermissionRepository};
use crate::db::{DbPool, get_connection, like_contains};
use crate::error::{AppError, AppResult};
use crate::models::{GroupEntity, GroupPermission, GroupRow, NewGroup, PermissionEntity};
use crate::schema::{group_permissions, groups, permissions};

/// Repositories backed by the connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Load the permission links of `rows` and build entities in row order.
async fn with_permissions(
    conn: &mut AsyncPgConnection,
    rows: Vec<GroupRow>,
) -> AppResult<Vec<GroupEntity>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
    let links: Vec<GroupPermission> = group_permissions::table
        .filter(group_permissions::group_id.eq_any(&ids))
        .select(GroupPermission::as_select())
        .load(conn)
        .await?;

    let mut by_group: HashMap<i32, Vec<i32>> = HashMap::new();
    for link in links {
        by_group
            .entry(link.group_id)
            .or_default()
            .push(link.permission_id);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let permission_ids = by_group.remove(&row.id).unwrap_or_default();
            GroupEntity::with_permissions(row.id, row.name, permission_ids)
        })
        .collect())
}

/// Map a unique violation on `groups.name` to a duplicate error.
fn map_save_error(e: diesel::result::Error) -> AppError {
    match e {
        diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        ) => AppError::duplicate("name"),
        other => AppError::Database(other),
    }
}

impl GroupRepository for PgStore {
    async fn sorted_list(&self, limit: i64, offset: i64) -> AppResult<Vec<GroupEntity>> {
        let mut conn = get_connection(&self.pool).await?;
        let rows: Vec<GroupRow> = groups::table
            .select(GroupRow::as_select())
            .order(groups::name.asc())
            .limit(limit)
            .offset(offset)
            .load(&mut conn)
            .await?;
        with_permissions(&mut conn, rows).await
    }

    async fn count(&self) -> AppResult<i64> {
        let mut conn = get_connection(&self.pool).await?;
        let total = groups::table.count().get_result(&mut conn).await?;
        Ok(total)
    }

    async fn list_matching_friendly_name(
        &self,
        term: &str,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<GroupEntity>> {
        let mut conn = get_connection(&self.pool).await?;
        let rows: Vec<GroupRow> = groups::table
            .filter(groups::name.ilike(like_contains(term)))
            .select(GroupRow::as_select())
            .order(groups::name.asc())
            .limit(limit)
            .offset(offset)
            .load(&mut conn)
            .await?;
        with_permissions(&mut conn, rows).await
    }

    async fn count_matching_friendly_name(&self, term: &str) -> AppResult<i64> {
        let mut conn = get_connection(&self.pool).await?;
        let total = groups::table
            .filter(groups::name.ilike(like_contains(term)))
            .count()
            .get_result(&mut conn)
            .await?;
        Ok(total)
    }

    async fn by_friendly_name(&self, name: &str) -> AppResult<Option<GroupEntity>> {
        let mut conn = get_connection(&self.pool).await?;
        let row: Option<GroupRow> = groups::table
            .filter(groups::name.eq(name))
            .select(GroupRow::as_select())
            .first(&mut conn)
            .await
            .optional()?;

        match row {
            Some(row) => Ok(with_permissions(&mut conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_by_friendly_names(&self, names: &[String]) -> AppResult<Vec<GroupEntity>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = get_connection(&self.pool).await?;
        let rows: Vec<GroupRow> = groups::table
            .filter(groups::name.eq_any(names))
            .select(GroupRow::as_select())
            .order(groups::name.asc())
            .load(&mut conn)
            .await?;
        with_permissions(&mut conn, rows).await
    }

    async fn save(&self, group: &mut GroupEntity) -> AppResult<()> {
        let mut conn = get_connection(&self.pool).await?;
        let existing_id = group.id;
        let name = group.name.clone();
        let permission_ids = group.permission_ids();

        let id = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                Box::pin(async move {
                    let id = match existing_id {
                        Some(id) => {
                            diesel::update(groups::table.find(id))
                                .set(groups::name.eq(&name))
                                .execute(conn)
                                .await?;
                            id
                        }
                        None => {
                            diesel::insert_into(groups::table)
                                .values(NewGroup { name: &name })
                                .returning(groups::id)
                                .get_result::<i32>(conn)
                                .await?
                        }
                    };

                    diesel::delete(
                        group_permissions::table.filter(group_permissions::group_id.eq(id)),
                    )
                    .execute(conn)
                    .await?;

                    let links: Vec<GroupPermission> = permission_ids
                        .into_iter()
                        .map(|permission_id| GroupPermission {
                            group_id: id,
                            permission_id,
                        })
                        .collect();
                    if !links.is_empty() {
                        diesel::insert_into(group_permissions::table)
                            .values(&links)
                            .execute(conn)
                            .await?;
                    }

                    Ok(id)
                })
            })
            .await
            .map_err(map_save_error)?;

        group.id = Some(id);
        Ok(())
    }

    async fn delete_by_friendly_names(&self, names: &[String]) -> AppResult<usize> {
        if names.is_empty() {
            return Ok(0);
        }
        let mut conn = get_connection(&self.pool).await?;
        // group_permissions rows go with the group (ON DELETE CASCADE)
        let deleted = diesel::delete(groups::table.filter(groups::name.eq_any(names)))
            .execute(&mut conn)
            .await?;
        Ok(deleted)
    }
}

impl PermissionRepository for PgStore {
    async fn all_sorted(&self) -> AppResult<Vec<PermissionEntity>> {
        let mut conn = get_connection(&self.pool).await?;
        let rows = permissions::table
            .select(PermissionEntity::as_select())
            .order(permissions::name.asc())
            .load(&mut conn)
            .await?;
        Ok(rows)
    }
}
