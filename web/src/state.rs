use crate::config::EnvConfig;
use anyhow::{Context, Result};
use libsample::{Database, sample::SampleService};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// State that lives for the whole process and is shared by every request
#[derive(Debug)]
pub struct SharedState {
    pub db: Database,
    pub samples: SampleService,
    pub config: EnvConfig,
}

impl SharedState {
    pub async fn new(env: EnvConfig) -> Result<Self> {
        trace!("Creating shared app state");
        let db = Database::open(&env.database, &env.pool_settings())
            .await
            .with_context(|| format!("Unable to open database {}", &env.database))?;
        Ok(Self::with_database(db, env))
    }

    fn with_database(db: Database, config: EnvConfig) -> Self {
        let mut samples = SampleService::sqlite(db.clone());
        if let Some(timeout) = config.request_timeout() {
            debug!(?timeout, "Using request timeout");
            samples = samples.with_timeout(timeout);
        }
        Self {
            db,
            samples,
            config,
        }
    }

    /// Release process-wide resources. Must be called once the server has
    /// stopped accepting requests.
    pub async fn shutdown(&self) {
        info!("Shutting down shared app state");
        self.db.close().await;
    }

    #[cfg(test)]
    pub fn test(pool: sqlx::Pool<sqlx::Sqlite>) -> Self {
        debug!("Creating test shared app state");
        Self::with_database(
            Database::from(pool),
            EnvConfig {
                listen: crate::config::ListenConfig {
                    host: "127.0.0.1".to_string(),
                    port: 8080,
                },
                database: "test-database.sqlite".to_string(),
                max_connections: None,
                request_timeout: Some(5),
            },
        )
    }
}

pub type AppState = Arc<SharedState>;
