use async_trait::async_trait;
use jiff::Timestamp;
use shortlink_core::repository::Result;
use shortlink_core::{LinkRecord, NewLink, ReadRepository, Repository, ShortCode, StorageError};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use tracing::debug;

const SCHEMA: &str = include_str!("../ddl/mysql/short_links.sql");

/// MySQL implementation of the repository contract.
///
/// Times are stored as unix seconds. Reads only return live records
/// (`expire_at IS NULL OR expire_at > now`); the collision probe
/// ([`ReadRepository::exists`]) also sees expired rows so a code is never
/// handed out twice while its row is still present.
#[derive(Debug, Clone)]
pub struct MySqlRepository {
    pool: MySqlPool,
}

impl MySqlRepository {
    /// Creates a repository from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a repository by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `short_links` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        debug!("short_links schema is in place");
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

fn now_unix_seconds() -> i64 {
    Timestamp::now().as_second()
}

fn parse_timestamp(column: &str, seconds: i64) -> Result<Timestamp> {
    Timestamp::from_second(seconds).map_err(|e| {
        StorageError::InvalidData(format!("invalid {column} timestamp '{seconds}': {e}"))
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

fn row_to_record(row: &MySqlRow) -> Result<LinkRecord> {
    let code: String = row.try_get("short_code").map_err(map_sqlx_error)?;
    let original_url: String = row.try_get("original_url").map_err(map_sqlx_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
    let modified_at: i64 = row.try_get("modified_at").map_err(map_sqlx_error)?;
    let expire_at: Option<i64> = row.try_get("expire_at").map_err(map_sqlx_error)?;
    let click_count: u64 = row.try_get("click_count").map_err(map_sqlx_error)?;

    Ok(LinkRecord {
        code: ShortCode::new_unchecked(code),
        original_url,
        created_at: parse_timestamp("created_at", created_at)?,
        modified_at: parse_timestamp("modified_at", modified_at)?,
        expire_at: expire_at
            .map(|value| parse_timestamp("expire_at", value))
            .transpose()?,
        click_count,
    })
}

#[async_trait]
impl ReadRepository for MySqlRepository {
    async fn get(&self, code: &ShortCode) -> Result<Option<LinkRecord>> {
        let row = sqlx::query(
            r#"
            SELECT short_code, original_url, created_at, modified_at, expire_at, click_count
            FROM short_links
            WHERE short_code = ?
              AND (expire_at IS NULL OR expire_at > ?)
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .bind(now_unix_seconds())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        let exists = sqlx::query(
            r#"
            SELECT 1
            FROM short_links
            WHERE short_code = ?
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .is_some();

        Ok(exists)
    }

    async fn live_codes(&self) -> Result<Vec<ShortCode>> {
        let rows = sqlx::query(
            r#"
            SELECT short_code
            FROM short_links
            WHERE expire_at IS NULL OR expire_at > ?
            "#,
        )
        .bind(now_unix_seconds())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>("short_code")
                    .map(ShortCode::new_unchecked)
                    .map_err(map_sqlx_error)
            })
            .collect()
    }
}

#[async_trait]
impl Repository for MySqlRepository {
    async fn insert(&self, link: NewLink) -> Result<()> {
        let now = now_unix_seconds();
        let expire_at = link.expire_at.map(|ts| ts.as_second());

        let result = sqlx::query(
            r#"
            INSERT INTO short_links (short_code, original_url, created_at, modified_at, expire_at, click_count)
            VALUES (?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(link.code.as_str())
        .bind(&link.original_url)
        .bind(now)
        .bind(now)
        .bind(expire_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => {
                Err(StorageError::Conflict(link.code.to_string()))
            }
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn increment_clicks(&self, code: &ShortCode) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE short_links
            SET click_count = click_count + 1
            WHERE short_code = ?
            "#,
        )
        .bind(code.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM short_links
            WHERE short_code = ?
            "#,
        )
        .bind(code.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
