use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::{
    auth::{
        jwt::TokenIssuer,
        password::Argon2Hasher,
        repo::{CredentialStore, MemoryCredentialStore, PgCredentialStore},
        services::AuthService,
    },
    config::{AppConfig, StoreBackend},
    db,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store: Arc<dyn CredentialStore> = match config.store {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL is not set")?;
                let pool = db::connect(url).await?;
                db::migrate(&pool).await?;
                info!("credential store: postgres");
                Arc::new(PgCredentialStore::new(pool))
            }
            StoreBackend::Memory => {
                warn!("credential store: in-memory, users are lost on restart");
                Arc::new(MemoryCredentialStore::default())
            }
        };

        Self::from_parts(config, store)
    }

    /// Builds hasher and token issuer from `config` once; both are immutable afterwards.
    pub fn from_parts(config: Arc<AppConfig>, store: Arc<dyn CredentialStore>) -> anyhow::Result<Self> {
        let hasher = Argon2Hasher::new(&config.hashing)?;
        let tokens = TokenIssuer::new(&config.jwt);
        Ok(Self {
            auth: Arc::new(AuthService::new(store, hasher, tokens)),
            config,
        })
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig::test_config());
        let store = Arc::new(MemoryCredentialStore::default()) as Arc<dyn CredentialStore>;
        Self::from_parts(config, store).expect("fake state")
    }
}
