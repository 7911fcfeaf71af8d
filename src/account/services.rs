use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    account::{
        dto::{
            AuthResponse, ProfileResponse, SignInRequest, SignUpRequest, UpdateProfileRequest,
            UserResponse,
        },
        password::{hash_password, verify_password, DummyHash},
        repo::{CountryStore, StoreError, UserStore},
        repo_types::{NewUser, User},
    },
    auth::jwt::{JwtKeys, TokenError},
};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(String),
    #[error("email already registered")]
    DuplicateEmail,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user not found")]
    NotFound,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
    #[error("token issuance failed: {0}")]
    Token(#[from] TokenError),
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn validate_sign_up(req: &SignUpRequest) -> Result<(), AccountError> {
    if !is_valid_email(&req.email) {
        return Err(AccountError::Validation("invalid email".into()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AccountError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if req.name.trim().is_empty() {
        return Err(AccountError::Validation("name is required".into()));
    }
    Ok(())
}

fn validate_sign_in(req: &SignInRequest) -> Result<(), AccountError> {
    if !is_valid_email(&req.email) {
        return Err(AccountError::Validation("invalid email".into()));
    }
    if req.password.is_empty() {
        return Err(AccountError::Validation("password is required".into()));
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Signup, signin and profile rules over injected stores.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    countries: Arc<dyn CountryStore>,
    keys: JwtKeys,
    dummy: DummyHash,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>, countries: Arc<dyn CountryStore>, keys: JwtKeys) -> Self {
        let dummy = DummyHash::new();
        if dummy.as_str().is_none() {
            warn!("dummy password hash unavailable; unknown-email sign-ins skip verification");
        }
        Self {
            users,
            countries,
            keys,
            dummy,
        }
    }

    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn sign_up(&self, req: SignUpRequest) -> Result<AuthResponse, AccountError> {
        validate_sign_up(&req)?;

        match self.users.find_by_email(&req.email).await {
            Ok(_) => {
                warn!("email already registered");
                return Err(AccountError::DuplicateEmail);
            }
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        let mobile_country_id = match non_empty(req.country) {
            Some(code) => self.resolve_country(&code).await,
            None => None,
        };

        let password_hash = hash_blocking(req.password).await?;

        let user = match self
            .users
            .create(NewUser {
                email: req.email,
                password_hash,
                name: req.name.trim().to_string(),
                phone: non_empty(req.phone),
                mobile_country_id,
            })
            .await
        {
            Ok(u) => u,
            // lost a race with a concurrent signup for the same email
            Err(StoreError::ConstraintViolation) => {
                warn!("email already registered (constraint)");
                return Err(AccountError::DuplicateEmail);
            }
            Err(e) => return Err(e.into()),
        };

        let token = self.keys.sign(user.uuid)?;
        info!(user_id = %user.uuid, "user registered");
        Ok(AuthResponse {
            message: "User registered successfully".into(),
            user: UserResponse::from(&user),
            token,
        })
    }

    #[instrument(skip(self, req), fields(email = %req.email))]
    pub async fn sign_in(&self, req: SignInRequest) -> Result<AuthResponse, AccountError> {
        validate_sign_in(&req)?;

        let password = req.password;
        let user = match self.users.find_by_email(&req.email).await {
            Ok(u) => u,
            Err(StoreError::NotFound) => {
                let dummy = self.dummy.clone();
                let _ = tokio::task::spawn_blocking(move || dummy.verify(&password)).await;
                warn!("login unknown email");
                return Err(AccountError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        let hash = user.password_hash.clone();
        let ok = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AccountError::Hashing(e.to_string()))?
            .map_err(|e| AccountError::Hashing(e.to_string()))?;
        if !ok {
            warn!(user_id = %user.uuid, "login invalid password");
            return Err(AccountError::InvalidCredentials);
        }

        let token = self.keys.sign(user.uuid)?;
        info!(user_id = %user.uuid, "user logged in");
        Ok(AuthResponse {
            message: "Login successful".into(),
            user: UserResponse::from(&user),
            token,
        })
    }

    #[instrument(skip(self))]
    pub async fn profile(&self, public_id: Uuid) -> Result<ProfileResponse, AccountError> {
        let user = self.load(public_id).await?;
        let country = match user.mobile_country_id {
            Some(id) => match self.countries.find_by_id(id).await {
                Ok(c) => Some(c),
                Err(e) => {
                    warn!(error = %e, country_id = id, "country lookup failed");
                    None
                }
            },
            None => None,
        };
        Ok(ProfileResponse {
            user: UserResponse::from(&user),
            country,
        })
    }

    #[instrument(skip(self, req))]
    pub async fn update_profile(
        &self,
        public_id: Uuid,
        req: UpdateProfileRequest,
    ) -> Result<ProfileResponse, AccountError> {
        let mut user = self.load(public_id).await?;
        if let Some(name) = req.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(AccountError::Validation("name is required".into()));
            }
            user.name = name.to_string();
        }
        if req.phone.is_some() {
            user.phone = non_empty(req.phone);
        }

        match self.users.update(&user).await {
            Ok(_) => {}
            Err(StoreError::NotFound) => return Err(AccountError::NotFound),
            Err(e) => return Err(e.into()),
        }
        info!(user_id = %public_id, "profile updated");
        self.profile(public_id).await
    }

    /// Soft-delete the account. Tokens already issued stay valid until they
    /// expire but no longer resolve to a user.
    #[instrument(skip(self))]
    pub async fn close_account(&self, public_id: Uuid) -> Result<(), AccountError> {
        let user = self.load(public_id).await?;
        match self.users.soft_delete(user.id).await {
            Ok(()) => {
                info!(user_id = %public_id, "account closed");
                Ok(())
            }
            Err(StoreError::NotFound) => Err(AccountError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    async fn load(&self, public_id: Uuid) -> Result<User, AccountError> {
        match self.users.find_by_public_id(public_id).await {
            Ok(u) => Ok(u),
            Err(StoreError::NotFound) => Err(AccountError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    // Country tagging is best-effort: any failure leaves the user untagged.
    async fn resolve_country(&self, code: &str) -> Option<i64> {
        match self.countries.find_by_short_code(code).await {
            Ok(c) => Some(c.id),
            Err(StoreError::NotFound) => {
                warn!(country = code, "unknown country code; continuing without it");
                None
            }
            Err(e) => {
                warn!(error = %e, country = code, "country lookup failed; continuing without it");
                None
            }
        }
    }
}

async fn hash_blocking(plain: String) -> Result<String, AccountError> {
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|e| AccountError::Hashing(e.to_string()))?
        .map_err(|e| AccountError::Hashing(e.to_string()))
}
