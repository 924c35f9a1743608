/// Auth Manager - Database connection pool setup.
///
/// Uses diesel-async with deadpool for async PostgreSQL connection pooling.
use diesel_async::AsyncPgConnection;
use diesel_async::RunQueryDsl;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::deadpool::{Object, Pool};
use secrecy::ExposeSecret;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Database connection pool type.
pub type DbPool = Pool<AsyncPgConnection>;

/// Database connection type (pooled async connection).
pub type DbConnection = Object<AsyncPgConnection>;

/// Create a new database connection pool.
///
/// Connections are opened lazily on first use.
pub async fn create_pool(config: &Config) -> AppResult<DbPool> {
    let manager =
        AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.database.url.expose_secret());

    let pool = Pool::builder(manager)
        .max_size(config.database.max_connections as usize)
        .build()
        .map_err(|e| AppError::Config(format!("Failed to create database pool: {}", e)))?;

    tracing::info!(
        "Database pool created with max {} connections",
        config.database.max_connections
    );

    Ok(pool)
}

/// Get a connection from the pool.
pub async fn get_connection(pool: &DbPool) -> AppResult<DbConnection> {
    pool.get().await.map_err(|e| {
        let (category, detail) = classify_pool_error(&e);
        tracing::error!(category, "Failed to get database connection: {}", detail);
        AppError::Internal(anyhow::anyhow!("Database {}: {}", category, detail))
    })
}

/// Round-trip a trivial query to check that the database answers.
pub async fn ping(pool: &DbPool) -> AppResult<()> {
    let mut conn = get_connection(pool).await?;
    diesel::sql_query("SELECT 1").execute(&mut conn).await?;
    Ok(())
}

/// Escape LIKE/ILIKE wildcard characters in a search pattern.
///
/// `%` and `_` are wildcards in PostgreSQL LIKE patterns and `\` is the
/// default escape character; all three are escaped so that a search term
/// always matches literally.
pub fn escape_like_pattern(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Build a LIKE/ILIKE "contains" pattern from user input.
///
/// Returns `%<escaped_input>%` suitable for use with `.ilike()`.
pub fn like_contains(input: &str) -> String {
    format!("%{}%", escape_like_pattern(input))
}

/// Classify a pool error into a short category and a detail message.
fn classify_pool_error(
    error: &diesel_async::pooled_connection::deadpool::PoolError,
) -> (&'static str, String) {
    use deadpool::managed::{PoolError, TimeoutType};
    use diesel_async::pooled_connection::PoolError as DieselPoolError;

    match error {
        PoolError::Backend(DieselPoolError::ConnectionError(e)) => {
            ("connection lost", format!("backend connection error: {e}"))
        }
        PoolError::Backend(DieselPoolError::QueryError(e)) => {
            ("connection lost", format!("backend query/ping error: {e}"))
        }
        PoolError::Timeout(TimeoutType::Wait) => (
            "pool exhausted",
            "timed out waiting for an available connection".to_string(),
        ),
        PoolError::Timeout(TimeoutType::Create) | PoolError::Timeout(TimeoutType::Recycle) => (
            "connection timeout",
            "timed out preparing a connection".to_string(),
        ),
        PoolError::Closed => ("pool closed", "connection pool has been closed".to_string()),
        PoolError::NoRuntimeSpecified => (
            "configuration error",
            "no async runtime specified for pool".to_string(),
        ),
        PoolError::PostCreateHook(hook_err) => (
            "connection hook failed",
            format!("post-create hook error: {hook_err}"),
        ),
    }
}
