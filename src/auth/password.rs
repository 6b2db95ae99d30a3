use std::sync::Arc;

use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, Secret};
use tracing::error;

use crate::{config::HashingConfig, errors::AuthError};

/// Verified against when a login names an unknown account.
const DUMMY_PASSWORD: &str = "dummy-password-for-unknown-accounts";

/// Argon2id hashing with a fixed work factor.
///
/// The `*_blocking` methods do the CPU-bound work inline. The async `hash`
/// and `verify` move it onto tokio's blocking pool.
#[derive(Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
    dummy_hash: Arc<str>,
}

impl Argon2Hasher {
    pub fn new(cfg: &HashingConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 parameters: {e}"))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let mut hasher = Self {
            argon2,
            dummy_hash: Arc::from(""),
        };
        hasher.dummy_hash = Arc::from(hasher.hash_blocking(DUMMY_PASSWORD)?);
        Ok(hasher)
    }

    /// Produces a PHC string embedding algorithm, parameters and a fresh salt.
    pub fn hash_blocking(&self, plain: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                AuthError::internal(format!("argon2 hash: {e}"))
            })?
            .to_string();
        Ok(hash)
    }

    /// Checks `plain` against a stored PHC string using the parameters embedded
    /// in that string. A hash that does not parse is an error, not a mismatch.
    pub fn verify_blocking(&self, plain: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            AuthError::internal(format!("argon2 parse: {e}"))
        })?;
        match self.argon2.verify_password(plain.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => {
                error!(error = %e, "argon2 verify_password error");
                Err(AuthError::internal(format!("argon2 verify: {e}")))
            }
        }
    }

    pub async fn hash(&self, plain: Secret<String>) -> Result<String, AuthError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash_blocking(plain.expose_secret()))
            .await
            .map_err(AuthError::internal)?
    }

    pub async fn verify(&self, plain: Secret<String>, hash: String) -> Result<bool, AuthError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify_blocking(plain.expose_secret(), &hash))
            .await
            .map_err(AuthError::internal)?
    }

    /// Spends the same effort as a real verification and discards the result.
    pub async fn verify_dummy(&self, plain: Secret<String>) -> Result<(), AuthError> {
        let hash = self.dummy_hash.to_string();
        self.verify(plain, hash).await.map(|_| ())
    }
}
