use super::{Sample, SampleRepository, SqliteSampleRepository};
use crate::{Database, Error, Result};
use std::{future::Future, time::Duration};
use tracing::{debug, trace};

/// Coordinates [SampleRepository] calls. The service owns transaction
/// boundaries: every write happens inside exactly one transaction that is
/// committed only if all of its steps succeed.
#[derive(Debug, Clone)]
pub struct SampleService<R = SqliteSampleRepository> {
    db: Database,
    repo: R,
    timeout: Option<Duration>,
}

impl SampleService<SqliteSampleRepository> {
    /// Create a service backed by the sqlite repository
    pub fn sqlite(db: Database) -> Self {
        let repo = SqliteSampleRepository::new(db.clone());
        Self::new(db, repo)
    }
}

impl<R: SampleRepository> SampleService<R> {
    pub fn new(db: Database, repo: R) -> Self {
        Self {
            db,
            repo,
            timeout: None,
        }
    }

    /// Abort any call that takes longer than `timeout`. The in-flight
    /// database statement is cancelled and [Error::Timeout] is returned.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn with_deadline<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| Error::Timeout(limit))?,
            None => fut.await,
        }
    }

    /// Store a new sample and its translations
    pub async fn create(&self, sample: Sample) -> Result<Sample> {
        sample.validate()?;
        debug!(
            name = %sample.name,
            translations = sample.translations.len(),
            "Creating sample"
        );
        let saved = self
            .with_deadline(async {
                let mut tx = self.db.begin().await?;
                let saved = self.repo.save(&mut tx, sample).await?;
                tx.commit().await?;
                Ok(saved)
            })
            .await?;
        trace!(id = ?saved.id, "Created sample");
        Ok(saved)
    }

    pub async fn get(&self, id: i64) -> Result<Sample> {
        trace!(id, "Fetching sample");
        self.with_deadline(self.repo.get(id)).await
    }

    /// Mark the sample as deleted. It will no longer be returned by [Self::get]
    pub async fn delete(&self, id: i64, user: &str) -> Result<()> {
        debug!(id, user, "Deleting sample");
        self.with_deadline(async {
            let mut tx = self.db.begin().await?;
            self.repo.delete(&mut tx, id, user).await?;
            tx.commit().await?;
            Ok(())
        })
        .await
    }
}
