use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::store::{MemoryStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Build state from the environment. Fails fast when the signing secret
    /// is absent.
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        Ok(Self {
            store: Arc::new(MemoryStore::new()),
            clock: Arc::new(SystemClock),
            config,
        })
    }

    pub fn from_parts(
        store: Arc<dyn UserStore>,
        clock: Arc<dyn Clock>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// State with a fixed test config, an empty store and the system clock.
    pub fn fake() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            clock: Arc::new(SystemClock),
            config: Arc::new(Self::fake_config()),
        }
    }

    pub fn fake_config() -> AppConfig {
        AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            cors_origins: vec![],
            jwt: crate::config::JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 30,
            },
        }
    }
}
