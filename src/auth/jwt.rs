use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{auth::claims::Claims, config::JwtConfig, errors::AuthError};

/// Signs and verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: TimeDuration,
    validation: Validation,
}

impl TokenIssuer {
    pub fn new(cfg: &JwtConfig) -> Self {
        let secret = cfg.secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&cfg.audience));
        validation.set_issuer(std::slice::from_ref(&cfg.issuer));
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: TimeDuration::seconds(cfg.ttl_minutes.saturating_mul(60)),
            validation,
        }
    }

    pub fn ttl(&self) -> TimeDuration {
        self.ttl
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, AuthError> {
        self.issue_with_ttl(user_id, self.ttl)
    }

    pub fn issue_with_ttl(&self, user_id: Uuid, ttl: TimeDuration) -> Result<String, AuthError> {
        let now = OffsetDateTime::now_utc();
        let exp = now
            .checked_add(ttl)
            .ok_or_else(|| AuthError::internal("token expiry out of range"))?;
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(AuthError::internal)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    /// Signature is checked before expiry, so a tampered token reports
    /// `TokenInvalid` even when its `exp` is also in the past.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => {
                    debug!(error = %e, "jwt rejected");
                    AuthError::TokenInvalid
                }
            }
        })?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn make_issuer(secret: &str, issuer: &str, audience: &str) -> TokenIssuer {
        TokenIssuer::new(&JwtConfig {
            secret: Secret::new(secret.into()),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 5,
        })
    }

    fn default_issuer() -> TokenIssuer {
        make_issuer("dev-secret-dev-secret-dev-secret!", "test-issuer", "test-aud")
    }

    fn flip_signature_char(token: &str) -> String {
        let (head, sig) = token.rsplit_once('.').expect("three segments");
        let mut chars: Vec<char> = sig.chars().collect();
        chars[0] = if chars[0] == 'A' { 'B' } else { 'A' };
        format!("{}.{}", head, chars.into_iter().collect::<String>())
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let issuer = default_issuer();
        let user_id = Uuid::new_v4();
        let token = issuer.issue(user_id).expect("issue");
        let claims = issuer.verify(&token).expect("verify");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.exp - claims.iat, 5 * 60);
    }

    #[test]
    fn expired_token_is_token_expired() {
        let issuer = default_issuer();
        let token = issuer
            .issue_with_ttl(Uuid::new_v4(), TimeDuration::minutes(-5))
            .unwrap();
        let err = issuer.verify(&token).unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired), "got {err:?}");
    }

    #[test]
    fn flipped_signature_is_token_invalid() {
        let issuer = default_issuer();
        let token = issuer.issue(Uuid::new_v4()).unwrap();
        let err = issuer.verify(&flip_signature_char(&token)).unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid), "got {err:?}");
    }

    #[test]
    fn tampered_expired_token_is_invalid_not_expired() {
        let issuer = default_issuer();
        let token = issuer
            .issue_with_ttl(Uuid::new_v4(), TimeDuration::minutes(-5))
            .unwrap();
        let err = issuer.verify(&flip_signature_char(&token)).unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid), "got {err:?}");
    }

    #[test]
    fn token_from_another_key_is_invalid() {
        let ours = default_issuer();
        let theirs = make_issuer("another-secret-another-secret-xx", "test-issuer", "test-aud");
        let token = theirs.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(ours.verify(&token), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn wrong_issuer_or_audience_is_invalid() {
        let secret = "same-secret-same-secret-same-sec";
        let good = make_issuer(secret, "good-iss", "good-aud");
        let bad_iss = make_issuer(secret, "bad-iss", "good-aud");
        let bad_aud = make_issuer(secret, "good-iss", "bad-aud");
        let token = good.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(bad_iss.verify(&token), Err(AuthError::TokenInvalid)));
        assert!(matches!(bad_aud.verify(&token), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn oversized_ttl_is_an_error_not_a_panic() {
        let issuer = TokenIssuer::new(&JwtConfig {
            secret: Secret::new("dev-secret-dev-secret-dev-secret!".into()),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: i64::MAX,
        });
        let err = issuer.issue(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)), "got {err:?}");

        let err = default_issuer()
            .issue_with_ttl(Uuid::new_v4(), TimeDuration::MAX)
            .unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)), "got {err:?}");
    }

    #[test]
    fn garbage_is_invalid() {
        let issuer = default_issuer();
        for token in ["", "abc", "a.b.c", "Bearer xyz"] {
            assert!(
                matches!(issuer.verify(token), Err(AuthError::TokenInvalid)),
                "token {token:?}"
            );
        }
    }
}
