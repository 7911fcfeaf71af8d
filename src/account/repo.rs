use std::{future::Future, time::Duration};

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::account::repo_types::{Country, NewUser, User};

/// Failures reported by the account stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("unique constraint violated")]
    ConstraintViolation,
    #[error("store call {0} timed out")]
    Timeout(&'static str),
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::ConstraintViolation
            }
            other => StoreError::Database(other),
        }
    }
}

/// Persistence for user accounts. Lookups only ever see rows that have not
/// been soft-deleted.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user and assign its public identifier.
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<User, StoreError>;
    async fn find_by_id(&self, id: i64) -> Result<User, StoreError>;
    async fn find_by_public_id(&self, uuid: Uuid) -> Result<User, StoreError>;
    /// Save mutable fields. The public identifier and `created_at` are never written.
    async fn update(&self, user: &User) -> Result<User, StoreError>;
    async fn soft_delete(&self, id: i64) -> Result<(), StoreError>;
}

/// Read-only access to the country reference table.
#[async_trait]
pub trait CountryStore: Send + Sync {
    async fn find_by_short_code(&self, code: &str) -> Result<Country, StoreError>;
    async fn find_by_id(&self, id: i64) -> Result<Country, StoreError>;
}

async fn bounded<T, F>(limit: Duration, op: &'static str, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res.map_err(StoreError::from),
        Err(_) => Err(StoreError::Timeout(op)),
    }
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
    timeout: Duration,
}

impl PgUserStore {
    pub fn new(db: PgPool, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let query = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (uuid, email, password_hash, name, phone, mobile_country_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, uuid, email, password_hash, name, phone, mobile_country_id,
                      created_at, updated_at, deleted_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.phone)
        .bind(user.mobile_country_id)
        .fetch_one(&self.db);
        bounded(self.timeout, "users.create", query).await
    }

    async fn find_by_email(&self, email: &str) -> Result<User, StoreError> {
        let query = sqlx::query_as::<_, User>(
            r#"
            SELECT id, uuid, email, password_hash, name, phone, mobile_country_id,
                   created_at, updated_at, deleted_at
            FROM users
            WHERE email = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db);
        bounded(self.timeout, "users.find_by_email", query)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_id(&self, id: i64) -> Result<User, StoreError> {
        let query = sqlx::query_as::<_, User>(
            r#"
            SELECT id, uuid, email, password_hash, name, phone, mobile_country_id,
                   created_at, updated_at, deleted_at
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db);
        bounded(self.timeout, "users.find_by_id", query)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_public_id(&self, uuid: Uuid) -> Result<User, StoreError> {
        let query = sqlx::query_as::<_, User>(
            r#"
            SELECT id, uuid, email, password_hash, name, phone, mobile_country_id,
                   created_at, updated_at, deleted_at
            FROM users
            WHERE uuid = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(uuid)
        .fetch_optional(&self.db);
        bounded(self.timeout, "users.find_by_public_id", query)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn update(&self, user: &User) -> Result<User, StoreError> {
        let query = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET email = $2,
                   password_hash = $3,
                   name = $4,
                   phone = $5,
                   mobile_country_id = $6,
                   updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, uuid, email, password_hash, name, phone, mobile_country_id,
                      created_at, updated_at, deleted_at
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.phone)
        .bind(user.mobile_country_id)
        .fetch_optional(&self.db);
        bounded(self.timeout, "users.update", query)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn soft_delete(&self, id: i64) -> Result<(), StoreError> {
        let query = sqlx::query(
            r#"
            UPDATE users
               SET deleted_at = now(), updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.db);
        let done = bounded(self.timeout, "users.soft_delete", query).await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct PgCountryStore {
    db: PgPool,
    timeout: Duration,
}

impl PgCountryStore {
    pub fn new(db: PgPool, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

#[async_trait]
impl CountryStore for PgCountryStore {
    async fn find_by_short_code(&self, code: &str) -> Result<Country, StoreError> {
        let query = sqlx::query_as::<_, Country>(
            r#"
            SELECT id, name, shortname, country_code, currency_name, currency_code,
                   currency_symbol, currency_rate, timezone_name, gmt, name_variant
            FROM country
            WHERE shortname = $1
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.db);
        bounded(self.timeout, "country.find_by_short_code", query)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_id(&self, id: i64) -> Result<Country, StoreError> {
        let query = sqlx::query_as::<_, Country>(
            r#"
            SELECT id, name, shortname, country_code, currency_name, currency_code,
                   currency_symbol, currency_rate, timezone_name, gmt, name_variant
            FROM country
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db);
        bounded(self.timeout, "country.find_by_id", query)
            .await?
            .ok_or(StoreError::NotFound)
    }
}
