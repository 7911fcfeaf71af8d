use std::time::Duration;

use anyhow::{bail, Context};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key/value source.
    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database = DatabaseConfig {
            url: database_url(&get)?,
            max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 10)?,
            timeout_secs: parse_or(&get, "DB_TIMEOUT_SECS", 5)?,
        };
        if database.timeout_secs == 0 {
            bail!("DB_TIMEOUT_SECS must be positive");
        }

        let secret = get("JWT_SECRET").context("JWT_SECRET must be set")?;
        if secret.trim().is_empty() {
            bail!("JWT_SECRET must not be empty");
        }
        let jwt = JwtConfig {
            secret,
            issuer: get("JWT_ISSUER").unwrap_or_else(|| "accounts".into()),
            audience: get("JWT_AUDIENCE").unwrap_or_else(|| "accounts-users".into()),
            ttl_minutes: parse_or(&get, "JWT_TTL_MINUTES", 60)?,
        };
        if jwt.ttl_minutes <= 0 {
            bail!("JWT_TTL_MINUTES must be positive");
        }

        let port = match get("APP_PORT").or_else(|| get("PORT")) {
            Some(v) => v.parse().with_context(|| format!("invalid port {v:?}"))?,
            None => 8080,
        };

        Ok(Self {
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            database,
            jwt,
        })
    }
}

// DATABASE_URL wins; otherwise the URL is assembled from the DB_* parts.
fn database_url<F>(get: &F) -> anyhow::Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = get("DATABASE_URL") {
        return Ok(url);
    }
    let host = get("DB_HOST").context("DATABASE_URL or DB_HOST must be set")?;
    let port = get("DB_PORT").unwrap_or_else(|| "5432".into());
    let user = get("DB_USER").unwrap_or_else(|| "postgres".into());
    let password = get("DB_PASSWORD").unwrap_or_default();
    let name = get("DB_NAME").unwrap_or_else(|| "postgres".into());
    Ok(format!("postgres://{user}:{password}@{host}:{port}/{name}"))
}

fn parse_or<F, T>(get: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match get(key) {
        Some(v) => v
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("invalid value for {key}: {v:?}")),
        None => Ok(default),
    }
}
