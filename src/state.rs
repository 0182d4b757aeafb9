use std::sync::Arc;

use crate::auth::repo::AuthenticationService;
use crate::boxes::repo::BoxService;
use crate::config::AppConfig;
use crate::db::MemoryDb;
use crate::pills::repo::PillService;
use crate::users::repo::UserService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserService>,
    pub pills: Arc<dyn PillService>,
    pub boxes: Arc<dyn BoxService>,
    pub auth: Arc<dyn AuthenticationService>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = if config.seed_demo_data {
            MemoryDb::seeded()
        } else {
            MemoryDb::new()
        };
        Ok(Self::with_db(config, db))
    }

    pub fn with_db(config: Arc<AppConfig>, db: MemoryDb) -> Self {
        let db = Arc::new(db);
        Self {
            config,
            users: db.clone(),
            pills: db.clone(),
            boxes: db.clone(),
            auth: db,
        }
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserService>,
        pills: Arc<dyn PillService>,
        boxes: Arc<dyn BoxService>,
        auth: Arc<dyn AuthenticationService>,
    ) -> Self {
        Self {
            config,
            users,
            pills,
            boxes,
            auth,
        }
    }
}

#[cfg(test)]
impl AppState {
    pub fn test_config() -> Arc<AppConfig> {
        Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            request_timeout: std::time::Duration::from_secs(60),
            seed_demo_data: true,
            jwt: crate::config::JwtConfig {
                secret: "test-secret".into(),
            },
        })
    }

    /// Seeded in-memory state with a fixed test secret.
    pub fn fake() -> Self {
        Self::with_db(Self::test_config(), MemoryDb::seeded())
    }
}
