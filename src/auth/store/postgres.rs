use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Connection, PgPool, Row, postgres::PgRow};
use tracing::{Instrument, info_span};
use uuid::Uuid;

use super::{DuplicateField, StoreError, UserStore};
use crate::auth::types::{NewUser, User};

pub const SCHEMA_SQL: &str = include_str!("../../../sql/schema.sql");

const USER_COLUMNS: &str =
    "id, username, email, password, salt, admin, status, created, modified, accessed";

/// `users` table in PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the `users` table when it does not exist yet.
    ///
    /// # Errors
    /// Returns an error if the statement fails.
    pub async fn apply_schema(&self) -> anyhow::Result<()> {
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "CREATE TABLE",
            db.statement = SCHEMA_SQL
        );
        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to apply users schema")?;
        Ok(())
    }
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password")?,
        salt: row.try_get("salt")?,
        admin: row.try_get("admin")?,
        status: row.try_get("status")?,
        created_at: row.try_get("created")?,
        modified_at: row.try_get("modified")?,
        accessed_at: row.try_get("accessed")?,
    })
}

/// Which unique constraint a failed insert tripped, if any (SQLSTATE 23505).
pub(super) fn duplicate_field(err: &sqlx::Error) -> Option<DuplicateField> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    if db_err.code().as_deref() != Some("23505") {
        return None;
    }
    match db_err.constraint() {
        Some(constraint) if constraint.contains("email") => Some(DuplicateField::Email),
        _ => Some(DuplicateField::Username),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn exists(&self, username: &str) -> Result<bool, StoreError> {
        let query = "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let exists: bool = sqlx::query_scalar(query)
            .bind(username)
            .fetch_one(&self.pool)
            .instrument(span)
            .await?;
        Ok(exists)
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let query = format!(
            "INSERT INTO users (id, username, email, password, salt, created, modified, accessed) \
             VALUES ($1, $2, $3, $4, $5, $6, $6, $6) RETURNING {USER_COLUMNS}"
        );
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = %query
        );
        let row = sqlx::query(&query)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.credentials.digest)
            .bind(&user.credentials.salt)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| match duplicate_field(&err) {
                Some(field) => StoreError::Duplicate(field),
                None => err.into(),
            })?;
        Ok(user_from_row(&row)?)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = %query
        );
        let row = sqlx::query(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;
        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn touch_accessed(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        let query = "UPDATE users SET accessed = $2 WHERE id = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .instrument(span)
            .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "PING"
        );
        async {
            let mut conn = self.pool.acquire().await?;
            conn.ping().await
        }
        .instrument(span)
        .await?;
        Ok(())
    }
}
