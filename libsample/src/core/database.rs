use crate::Result;
use sqlx::{
    Pool, Sqlite, Transaction,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::{path::Path, time::Duration};
use tracing::{debug, trace};

/// Settings for the shared connection pool
#[derive(Debug, Clone, PartialEq)]
pub struct PoolSettings {
    /// The maximum number of connections the pool will open
    pub max_connections: u32,
    /// How long to wait for a free connection before giving up
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

/// An object that represents a connection pool to the sample database. It is
/// cheap to clone, and all clones share the same pool.
#[derive(Clone, Debug)]
pub struct Database(Pool<Sqlite>);

impl From<Pool<Sqlite>> for Database {
    /// Wrap an existing pool. This is primarily intended for tests.
    fn from(value: Pool<Sqlite>) -> Self {
        Self(value)
    }
}

impl Database {
    /// Open a connection pool for the specified database file. The schema is
    /// expected to exist already; no migrations are run.
    pub async fn open<P: AsRef<Path>>(db: P, settings: &PoolSettings) -> Result<Self> {
        let path = db.as_ref();
        debug!(?path, ?settings, "Opening database pool");
        let options = SqliteConnectOptions::new()
            .filename(path)
            .foreign_keys(true);
        let dbpool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect_with(options)
            .await?;
        Ok(Database(dbpool))
    }

    /// gets a reference to the underlying sqlx connection pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.0
    }

    /// Start a new transaction. The transaction is rolled back when it is
    /// dropped without being committed.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        trace!("Beginning transaction");
        Ok(self.0.begin().await?)
    }

    /// Close every connection in the pool and wait for checked-out
    /// connections to be returned. Further attempts to acquire a connection
    /// will fail.
    pub async fn close(&self) {
        debug!("Closing database pool");
        self.0.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test(sqlx::test(migrations = "../db/migrations/"))]
    async fn test_close_rejects_new_transactions(pool: Pool<Sqlite>) {
        let db = Database::from(pool);
        assert!(!db.is_closed());
        db.begin()
            .await
            .expect("Failed to begin transaction")
            .rollback()
            .await
            .expect("Failed to roll back");

        db.close().await;
        assert!(db.is_closed());
        match db.begin().await {
            Ok(_) => panic!("pool should be closed"),
            Err(err) => assert_eq!(err.kind(), crate::ErrorKind::Internal),
        }
    }

    #[test]
    fn test_default_pool_settings() {
        let settings = PoolSettings::default();
        assert_eq!(settings.max_connections, 5);
        assert_eq!(settings.acquire_timeout, Duration::from_secs(30));
    }
}
