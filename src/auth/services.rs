use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use secrecy::{ExposeSecret, Secret};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{dto::PublicUser, jwt::TokenIssuer, password::Argon2Hasher, repo::CredentialStore},
    errors::AuthError,
};

const MAX_EMAIL_LEN: usize = 254;
const MIN_PASSWORD_LEN: usize = 6;
const MAX_PASSWORD_LEN: usize = 128;
const MAX_DISPLAY_NAME_LEN: usize = 100;
const PASSWORD_SYMBOLS: &str = "@$!%*#?&";

/// Authenticated principal resolved from a bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject {
    pub user_id: Uuid,
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub token: String,
    pub expires_in: i64,
    pub user: PublicUser,
}

/// Registration, login and token authentication over a credential store.
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: Argon2Hasher,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, hasher: Argon2Hasher, tokens: TokenIssuer) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    #[instrument(skip(self, password, display_name))]
    pub async fn register(
        &self,
        email: &str,
        password: Secret<String>,
        display_name: &str,
    ) -> Result<PublicUser, AuthError> {
        let email = normalize_email(email);
        check_email(&email)?;
        check_password_policy(password.expose_secret())?;
        let display_name = sanitize_display_name(display_name);
        check_display_name(&display_name)?;

        let hash = self.hasher.hash(password).await?;

        let user = match self.store.create(&email, &display_name, &hash).await {
            Ok(u) => u,
            Err(e) => {
                let err = AuthError::from(e);
                if matches!(err, AuthError::DuplicateIdentity) {
                    warn!(email = %email, "email already registered");
                }
                return Err(err);
            }
        };

        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(PublicUser::from(&user))
    }

    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: Secret<String>,
    ) -> Result<LoginOutcome, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || password.expose_secret().is_empty() {
            return Err(AuthError::InvalidInput(
                "Email and password are required".into(),
            ));
        }

        let Some(user) = self.store.find_by_email(&email).await? else {
            self.hasher.verify_dummy(password).await?;
            warn!(email = %email, "login unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.verify(password, user.password_hash.clone()).await? {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id)?;
        info!(user_id = %user.id, "user logged in");
        Ok(LoginOutcome {
            token,
            expires_in: self.tokens.ttl().whole_seconds(),
            user: PublicUser::from(&user),
        })
    }

    /// Resolves a bearer token to its subject. Pure; never touches the store.
    pub fn authenticate(&self, token: &str) -> Result<Subject, AuthError> {
        let claims = self.tokens.verify(token)?;
        Ok(Subject {
            user_id: claims.sub,
        })
    }

    /// A token for an account that no longer exists is treated as invalid.
    pub async fn profile(&self, subject: Subject) -> Result<PublicUser, AuthError> {
        let user = self
            .store
            .find_by_id(subject.user_id)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %subject.user_id, "token subject not found");
                AuthError::TokenInvalid
            })?;
        Ok(PublicUser::from(&user))
    }
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid");
    }
    email.len() <= MAX_EMAIL_LEN && EMAIL_RE.is_match(email)
}

fn check_email(email: &str) -> Result<(), AuthError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(AuthError::InvalidInput("Invalid email".into()))
    }
}

/// At least one letter and one digit; letters, digits and `@$!%*#?&` only.
pub(crate) fn check_password_policy(password: &str) -> Result<(), AuthError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(AuthError::InvalidInput(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(AuthError::InvalidInput(format!(
            "Password must be at most {MAX_PASSWORD_LEN} characters"
        )));
    }
    if !password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SYMBOLS.contains(c))
    {
        return Err(AuthError::InvalidInput(format!(
            "Password may only contain letters, digits and {PASSWORD_SYMBOLS}"
        )));
    }
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_letter && has_digit) {
        return Err(AuthError::InvalidInput(
            "Password must contain a letter and a digit".into(),
        ));
    }
    Ok(())
}

pub(crate) fn sanitize_display_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn check_display_name(name: &str) -> Result<(), AuthError> {
    if name.is_empty() {
        return Err(AuthError::InvalidInput("Name is required".into()));
    }
    if name.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(AuthError::InvalidInput(format!(
            "Name must be at most {MAX_DISPLAY_NAME_LEN} characters"
        )));
    }
    Ok(())
}
