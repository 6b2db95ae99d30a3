use std::{net::SocketAddr, str::FromStr};

use anyhow::{bail, ensure, Context};
use secrecy::Secret;

/// Minimum HS256 key length accepted at startup.
const MIN_SECRET_LEN: usize = 32;
/// One year.
const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Argon2id work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub hashing: HashingConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = match lookup("STORE_BACKEND").as_deref() {
            None | Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some(other) => bail!("unknown STORE_BACKEND {other:?} (expected postgres or memory)"),
        };

        let database_url = lookup("DATABASE_URL");
        if store == StoreBackend::Postgres {
            ensure!(
                database_url.is_some(),
                "DATABASE_URL is required when STORE_BACKEND=postgres"
            );
        }

        let secret = lookup("JWT_SECRET").context("JWT_SECRET is not set")?;
        ensure!(
            secret.len() >= MIN_SECRET_LEN,
            "JWT_SECRET must be at least {MIN_SECRET_LEN} bytes"
        );

        let jwt = JwtConfig {
            secret: Secret::new(secret),
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "policylab".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "policylab-users".into()),
            ttl_minutes: parse_or(&lookup, "JWT_TTL_MINUTES", 60),
        };
        ensure!(
            (1..=MAX_TTL_MINUTES).contains(&jwt.ttl_minutes),
            "JWT_TTL_MINUTES must be between 1 and {MAX_TTL_MINUTES}"
        );

        let defaults = HashingConfig::default();
        let hashing = HashingConfig {
            memory_kib: parse_or(&lookup, "ARGON2_MEMORY_KIB", defaults.memory_kib),
            iterations: parse_or(&lookup, "ARGON2_ITERATIONS", defaults.iterations),
            parallelism: parse_or(&lookup, "ARGON2_PARALLELISM", defaults.parallelism),
        };

        Ok(Self {
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "APP_PORT", 8080),
            store,
            database_url,
            jwt,
            hashing,
        })
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            store: StoreBackend::Memory,
            database_url: None,
            jwt: JwtConfig {
                secret: Secret::new("test-secret-test-secret-test-secret".into()),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
            },
            // Smallest parameters argon2 accepts; keeps tests fast.
            hashing: HashingConfig {
                memory_kib: 8,
                iterations: 1,
                parallelism: 1,
            },
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_optional_vars_missing() {
        let cfg = load(&[("DATABASE_URL", "postgres://localhost/db"), ("JWT_SECRET", SECRET)])
            .expect("config should load");
        assert_eq!(cfg.store, StoreBackend::Postgres);
        assert_eq!(cfg.jwt.issuer, "policylab");
        assert_eq!(cfg.jwt.audience, "policylab-users");
        assert_eq!(cfg.jwt.ttl_minutes, 60);
        assert_eq!(cfg.hashing, HashingConfig::default());
        assert_eq!(cfg.bind_addr().unwrap().port(), 8080);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = load(&[("DATABASE_URL", "postgres://localhost/db")]).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn short_secret_is_rejected() {
        let err = load(&[("STORE_BACKEND", "memory"), ("JWT_SECRET", "short")]).unwrap_err();
        assert!(err.to_string().contains("at least"));
    }

    #[test]
    fn postgres_backend_requires_database_url() {
        let err = load(&[("JWT_SECRET", SECRET)]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn memory_backend_needs_no_database() {
        let cfg = load(&[
            ("STORE_BACKEND", "memory"),
            ("JWT_SECRET", SECRET),
            ("ARGON2_MEMORY_KIB", "65536"),
            ("JWT_TTL_MINUTES", "15"),
        ])
        .expect("config should load");
        assert_eq!(cfg.store, StoreBackend::Memory);
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.hashing.memory_kib, 65_536);
        assert_eq!(cfg.jwt.ttl_minutes, 15);
    }

    #[test]
    fn ttl_outside_one_year_is_rejected() {
        for ttl in ["0", "-5", "525601", "1000000000000"] {
            let err = load(&[
                ("STORE_BACKEND", "memory"),
                ("JWT_SECRET", SECRET),
                ("JWT_TTL_MINUTES", ttl),
            ])
            .unwrap_err();
            assert!(err.to_string().contains("JWT_TTL_MINUTES"), "ttl {ttl}");
        }
        let cfg = load(&[
            ("STORE_BACKEND", "memory"),
            ("JWT_SECRET", SECRET),
            ("JWT_TTL_MINUTES", "525600"),
        ])
        .expect("one year is allowed");
        assert_eq!(cfg.jwt.ttl_minutes, MAX_TTL_MINUTES);
    }

    #[test]
    fn unknown_backend_is_rejected() {
        assert!(load(&[("STORE_BACKEND", "redis"), ("JWT_SECRET", SECRET)]).is_err());
    }

    #[test]
    fn debug_output_redacts_secret() {
        let cfg = load(&[("STORE_BACKEND", "memory"), ("JWT_SECRET", SECRET)]).unwrap();
        assert!(!format!("{cfg:?}").contains(SECRET));
    }
}
