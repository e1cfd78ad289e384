//! Storage for [Sample] objects and their translations.
//!
//! The repository is the only place that builds SQL for the `sample` and
//! `sample_translation` tables. Write operations run on a transaction owned by
//! the caller so that a sample and its translations are committed or rolled
//! back together.
use super::{Sample, Translation};
use crate::{
    Database, Error, Result,
    core::query::{ChildRow, MultiRowInsert},
};
use async_trait::async_trait;
use sqlx::{FromRow, Sqlite, SqliteConnection, Transaction};

/// The resource path reported to clients when a sample can't be found
pub const SAMPLE_RESOURCE: &str = "/data/sample";

const TRANSLATION_TABLE: &str = "sample_translation";

#[async_trait]
pub trait SampleRepository: Send + Sync {
    /// Insert `sample` and all of its translations, returning the sample with
    /// every server-assigned field filled in.
    async fn save(&self, tx: &mut Transaction<'_, Sqlite>, sample: Sample) -> Result<Sample>;

    /// Fetch a sample that has not been deleted, including its translations
    async fn get(&self, id: i64) -> Result<Sample>;

    /// Mark a sample as deleted on behalf of `user`
    async fn delete(&self, tx: &mut Transaction<'_, Sqlite>, id: i64, user: &str) -> Result<()>;
}

/// A [SampleRepository] that stores samples in an sqlite database
#[derive(Clone, Debug)]
pub struct SqliteSampleRepository {
    db: Database,
}

impl SqliteSampleRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SampleRepository for SqliteSampleRepository {
    async fn save(&self, tx: &mut Transaction<'_, Sqlite>, sample: Sample) -> Result<Sample> {
        if let Some(id) = sample.id {
            return Err(Error::InvalidInsertObjectAlreadyExists(id));
        }
        let mut saved: Sample = sqlx::query_as(
            r#"INSERT INTO sample (name, description, amount, created_by, last_modified_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, amount, version,
                created_at, created_by, last_modified_at, last_modified_by"#,
        )
        .bind(&sample.name)
        .bind(&sample.description)
        .bind(sample.amount)
        .bind(&sample.created_by)
        .bind(&sample.last_modified_by)
        .fetch_one(tx.as_mut())
        .await?;

        let id = saved.id.ok_or_else(|| {
            Error::InvalidState("inserted sample was not assigned an id".to_string())
        })?;
        saved.translations = insert_translations(tx.as_mut(), id, sample.translations).await?;
        Ok(saved)
    }

    async fn get(&self, id: i64) -> Result<Sample> {
        let mut sample: Sample = match sqlx::query_as(
            r#"SELECT id, name, description, amount, version,
                created_at, created_by, last_modified_at, last_modified_by
            FROM sample WHERE id = $1 AND deleted_at IS NULL"#,
        )
        .bind(id)
        .fetch_one(self.db.pool())
        .await
        {
            Ok(sample) => sample,
            Err(sqlx::Error::RowNotFound) => return Err(Error::not_found(id, SAMPLE_RESOURCE)),
            Err(e) => return Err(e.into()),
        };

        sample.translations = sqlx::query_as(
            r#"SELECT name, description, language, ordinal
            FROM sample_translation WHERE id = $1 ORDER BY rowid"#,
        )
        .bind(id)
        .fetch_all(self.db.pool())
        .await?;
        Ok(sample)
    }

    async fn delete(&self, tx: &mut Transaction<'_, Sqlite>, id: i64, user: &str) -> Result<()> {
        let res = sqlx::query(
            r#"UPDATE sample
            SET deleted_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now'),
                last_modified_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now'),
                last_modified_by = $2,
                version = version + 1
            WHERE id = $1 AND deleted_at IS NULL"#,
        )
        .bind(id)
        .bind(user)
        .execute(tx.as_mut())
        .await?;
        if res.rows_affected() == 0 {
            return Err(Error::not_found(id, SAMPLE_RESOURCE));
        }
        Ok(())
    }
}

/// Insert all translations for the sample `id` with a single statement and
/// return them as stored.
async fn insert_translations(
    conn: &mut SqliteConnection,
    id: i64,
    translations: Vec<Translation>,
) -> Result<Vec<Translation>> {
    let Some(insert) = MultiRowInsert::new(
        TRANSLATION_TABLE,
        "id",
        id,
        &translations,
        Translation::COLUMNS,
    ) else {
        return Ok(translations);
    };

    let returned = insert
        .build()
        .fetch_all(&mut *conn)
        .await?
        .iter()
        .map(Translation::from_row)
        .collect::<sqlx::Result<Vec<Translation>>>()?;
    correlate(&translations, returned)
}

/// Put the rows returned by a multi-row insert back into the order of the
/// rows that were submitted. The database doesn't promise to return rows in
/// statement order, so each returned row is matched by value to the first
/// submitted row that hasn't been claimed yet.
fn correlate(submitted: &[Translation], returned: Vec<Translation>) -> Result<Vec<Translation>> {
    if submitted.len() != returned.len() {
        return Err(Error::InvalidState(format!(
            "inserted {} translations but {} were returned",
            submitted.len(),
            returned.len()
        )));
    }

    let mut slots: Vec<Option<Translation>> = vec![None; submitted.len()];
    for row in returned {
        let pos = submitted
            .iter()
            .enumerate()
            .position(|(i, t)| slots[i].is_none() && *t == row)
            .ok_or_else(|| {
                Error::InvalidState(format!(
                    "returned translation '{}' ({}) does not match any inserted row",
                    row.name, row.language
                ))
            })?;
        slots[pos] = Some(row);
    }
    Ok(slots.into_iter().flatten().collect())
}
