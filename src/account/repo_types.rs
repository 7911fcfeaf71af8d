use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    #[serde(skip_serializing)]
    pub id: i64,                              // internal key, never leaves the service
    pub uuid: Uuid,                           // public identifier
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,                // Argon2 hash, not exposed in JSON
    pub name: String,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub mobile_country_id: Option<i64>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    #[serde(skip_serializing)]
    pub deleted_at: Option<OffsetDateTime>,
}

/// Fields supplied by the service when creating a user. The store fills in
/// the keys and timestamps.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub phone: Option<String>,
    pub mobile_country_id: Option<i64>,
}

/// Reference country row. Seeded outside this service and only ever read.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Country {
    #[serde(skip_serializing)]
    pub id: i64,
    pub name: Option<String>,
    pub shortname: Option<String>,
    pub country_code: Option<i32>,
    pub currency_name: Option<String>,
    pub currency_code: Option<String>,
    pub currency_symbol: Option<String>,
    pub currency_rate: Option<f64>,
    pub timezone_name: Option<String>,
    pub gmt: Option<String>,
    pub name_variant: Option<String>,
}
