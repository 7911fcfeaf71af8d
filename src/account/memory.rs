//! In-process stores backed by a `RwLock`. They honour the same contract as
//! the Postgres adapters, including email uniqueness over live rows, and are
//! what the test suites run against.

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::account::{
    repo::{CountryStore, StoreError, UserStore},
    repo_types::{Country, NewUser, User},
};

#[derive(Default)]
pub struct MemoryUserStore {
    rows: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored row, soft-deleted ones included.
    pub async fn all_rows(&self) -> Vec<User> {
        self.rows.read().await.clone()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut rows = self.rows.write().await;
        if rows
            .iter()
            .any(|u| u.deleted_at.is_none() && u.email == user.email)
        {
            return Err(StoreError::ConstraintViolation);
        }

        let now = OffsetDateTime::now_utc();
        let row = User {
            id: rows.len() as i64 + 1,
            uuid: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            phone: user.phone,
            mobile_country_id: user.mobile_country_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.rows
            .read()
            .await
            .iter()
            .find(|u| u.deleted_at.is_none() && u.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_id(&self, id: i64) -> Result<User, StoreError> {
        self.rows
            .read()
            .await
            .iter()
            .find(|u| u.deleted_at.is_none() && u.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_public_id(&self, uuid: Uuid) -> Result<User, StoreError> {
        self.rows
            .read()
            .await
            .iter()
            .find(|u| u.deleted_at.is_none() && u.uuid == uuid)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update(&self, user: &User) -> Result<User, StoreError> {
        let mut rows = self.rows.write().await;
        if rows
            .iter()
            .any(|u| u.deleted_at.is_none() && u.id != user.id && u.email == user.email)
        {
            return Err(StoreError::ConstraintViolation);
        }

        let row = rows
            .iter_mut()
            .find(|u| u.deleted_at.is_none() && u.id == user.id)
            .ok_or(StoreError::NotFound)?;
        row.email = user.email.clone();
        row.password_hash = user.password_hash.clone();
        row.name = user.name.clone();
        row.phone = user.phone.clone();
        row.mobile_country_id = user.mobile_country_id;
        row.updated_at = OffsetDateTime::now_utc();
        Ok(row.clone())
    }

    async fn soft_delete(&self, id: i64) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|u| u.deleted_at.is_none() && u.id == id)
            .ok_or(StoreError::NotFound)?;
        let now = OffsetDateTime::now_utc();
        row.deleted_at = Some(now);
        row.updated_at = now;
        Ok(())
    }
}

pub struct MemoryCountryStore {
    rows: Vec<Country>,
}

impl MemoryCountryStore {
    pub fn new(rows: Vec<Country>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl CountryStore for MemoryCountryStore {
    async fn find_by_short_code(&self, code: &str) -> Result<Country, StoreError> {
        self.rows
            .iter()
            .find(|c| c.shortname.as_deref() == Some(code))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_id(&self, id: i64) -> Result<Country, StoreError> {
        self.rows
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

/// A store whose backend is unreachable: every call times out.
#[derive(Default)]
pub struct UnavailableStore;

#[async_trait]
impl UserStore for UnavailableStore {
    async fn create(&self, _user: NewUser) -> Result<User, StoreError> {
        Err(StoreError::Timeout("users.create"))
    }

    async fn find_by_email(&self, _email: &str) -> Result<User, StoreError> {
        Err(StoreError::Timeout("users.find_by_email"))
    }

    async fn find_by_id(&self, _id: i64) -> Result<User, StoreError> {
        Err(StoreError::Timeout("users.find_by_id"))
    }

    async fn find_by_public_id(&self, _uuid: Uuid) -> Result<User, StoreError> {
        Err(StoreError::Timeout("users.find_by_public_id"))
    }

    async fn update(&self, _user: &User) -> Result<User, StoreError> {
        Err(StoreError::Timeout("users.update"))
    }

    async fn soft_delete(&self, _id: i64) -> Result<(), StoreError> {
        Err(StoreError::Timeout("users.soft_delete"))
    }
}

#[async_trait]
impl CountryStore for UnavailableStore {
    async fn find_by_short_code(&self, _code: &str) -> Result<Country, StoreError> {
        Err(StoreError::Timeout("country.find_by_short_code"))
    }

    async fn find_by_id(&self, _id: i64) -> Result<Country, StoreError> {
        Err(StoreError::Timeout("country.find_by_id"))
    }
}

pub(crate) fn sample_countries() -> Vec<Country> {
    vec![
        Country {
            id: 1,
            name: Some("United States".into()),
            shortname: Some("US".into()),
            country_code: Some(1),
            currency_name: Some("US Dollar".into()),
            currency_code: Some("USD".into()),
            currency_symbol: Some("$".into()),
            currency_rate: Some(1.0),
            timezone_name: Some("America/New_York".into()),
            gmt: Some("-5".into()),
            name_variant: None,
        },
        Country {
            id: 2,
            name: Some("Thailand".into()),
            shortname: Some("TH".into()),
            country_code: Some(66),
            currency_name: Some("Thai Baht".into()),
            currency_code: Some("THB".into()),
            currency_symbol: Some("฿".into()),
            currency_rate: Some(36.5),
            timezone_name: Some("Asia/Bangkok".into()),
            gmt: Some("+7".into()),
            name_variant: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            password_hash: "$argon2id$stub".into(),
            name: "Test".into(),
            phone: None,
            mobile_country_id: None,
        }
    }

    #[tokio::test]
    async fn create_assigns_distinct_keys() {
        let store = MemoryUserStore::new();
        let a = store.create(new_user("a@b.com")).await.unwrap();
        let b = store.create(new_user("c@d.com")).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_ne!(a.uuid, b.uuid);
        assert_eq!(store.find_by_public_id(b.uuid).await.unwrap().id, b.id);
        assert_eq!(store.find_by_id(a.id).await.unwrap().uuid, a.uuid);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_constraint_violation() {
        let store = MemoryUserStore::new();
        store.create(new_user("a@b.com")).await.unwrap();
        let err = store.create(new_user("a@b.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation));
    }

    #[tokio::test]
    async fn email_comparison_is_case_sensitive() {
        let store = MemoryUserStore::new();
        store.create(new_user("a@b.com")).await.unwrap();
        store.create(new_user("A@b.com")).await.unwrap();
        assert!(matches!(
            store.find_by_email("A@B.COM").await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn soft_deleted_rows_are_hidden_but_kept() {
        let store = MemoryUserStore::new();
        let user = store.create(new_user("a@b.com")).await.unwrap();
        store.soft_delete(user.id).await.unwrap();

        assert!(matches!(
            store.find_by_email("a@b.com").await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            store.soft_delete(user.id).await,
            Err(StoreError::NotFound)
        ));
        assert_eq!(store.all_rows().await.len(), 1);

        // the email is free again once the old row is deleted
        let again = store.create(new_user("a@b.com")).await.unwrap();
        assert_ne!(again.uuid, user.uuid);
    }

    #[tokio::test]
    async fn update_keeps_public_id_and_creation_time() {
        let store = MemoryUserStore::new();
        let user = store.create(new_user("a@b.com")).await.unwrap();
        let mut changed = user.clone();
        changed.name = "Renamed".into();
        changed.uuid = Uuid::new_v4();

        let saved = store.update(&changed).await.unwrap();
        assert_eq!(saved.name, "Renamed");
        assert_eq!(saved.uuid, user.uuid);
        assert_eq!(saved.created_at, user.created_at);
    }

    #[tokio::test]
    async fn country_lookup_by_code() {
        let store = MemoryCountryStore::new(sample_countries());
        let us = store.find_by_short_code("US").await.unwrap();
        assert_eq!(us.id, 1);
        assert!(matches!(
            store.find_by_short_code("ZZ").await,
            Err(StoreError::NotFound)
        ));
        assert_eq!(
            store.find_by_id(2).await.unwrap().shortname.as_deref(),
            Some("TH")
        );
    }
}
