use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use std::sync::Arc;
use tracing::error;

/// Hash with Argon2id default parameters and a fresh random salt.
pub fn hash_password(plain: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            e
        })?
        .to_string();
    Ok(hash)
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash cannot be parsed.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, password_hash::Error> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        e
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Throwaway hash verified against when the email is unknown, so that
/// sign-in costs one verification whether or not the account exists.
/// Must exist before the first sign-in, or that request pays for a full hash.
#[derive(Clone)]
pub struct DummyHash(Arc<Option<String>>);

impl DummyHash {
    pub fn new() -> Self {
        Self(Arc::new(hash_password("dummy-password-for-timing").ok()))
    }

    /// Burn one verification. Always reports a mismatch.
    pub fn verify(&self, plain: &str) -> bool {
        if let Some(hash) = self.0.as_deref() {
            let _ = verify_password(plain, hash);
        }
        false
    }

    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl Default for DummyHash {
    fn default() -> Self {
        Self::new()
    }
}
