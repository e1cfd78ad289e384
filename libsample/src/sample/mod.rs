//! Objects to keep track of samples and their translations
use crate::{
    Error, Result,
    core::query::{BindValue, ChildRow},
};
use sqlx::{FromRow, Row, sqlite::SqliteRow};
use time::OffsetDateTime;

pub use repository::{SAMPLE_RESOURCE, SampleRepository, SqliteSampleRepository};
pub use service::SampleService;

pub mod repository;
pub mod service;

/// The most translations a single sample can be saved with
pub const MAX_TRANSLATIONS: usize = Translation::MAX_ROWS;

/// A sample together with its translations.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// The database ID for this sample. This is `None` until the sample has
    /// been saved.
    pub id: Option<i64>,
    pub name: String,
    pub description: String,
    pub amount: f64,
    /// Incremented each time the stored row changes
    pub version: i16,
    pub translations: Vec<Translation>,
    pub created_at: Option<OffsetDateTime>,
    pub created_by: String,
    pub last_modified_at: Option<OffsetDateTime>,
    pub last_modified_by: String,
}

/// The name and description of a sample in a particular language
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Translation {
    pub name: String,
    pub description: String,
    /// A language code such as `en` or `fr`
    pub language: String,
    /// Controls the display order of translations
    pub ordinal: i16,
}

impl Sample {
    /// Create a new sample that has not been saved yet. `user` is recorded
    /// as both the creator and the last modifier.
    pub fn new(name: String, description: String, amount: f64, user: &str) -> Self {
        Self {
            id: None,
            name,
            description,
            amount,
            version: 0,
            translations: Default::default(),
            created_at: None,
            created_by: user.to_string(),
            last_modified_at: None,
            last_modified_by: user.to_string(),
        }
    }

    pub fn with_translation(mut self, translation: Translation) -> Self {
        self.translations.push(translation);
        self
    }

    /// Check that this sample can be stored
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidData("sample name must not be empty".into()));
        }
        if !self.amount.is_finite() {
            return Err(Error::InvalidData(format!(
                "sample amount must be a finite number, got {}",
                self.amount
            )));
        }
        if self.created_by.is_empty() || self.last_modified_by.is_empty() {
            return Err(Error::InvalidData(
                "sample creator and modifier must be specified".into(),
            ));
        }
        if self.translations.len() > MAX_TRANSLATIONS {
            return Err(Error::InvalidData(format!(
                "a sample can have at most {MAX_TRANSLATIONS} translations, got {}",
                self.translations.len()
            )));
        }
        for t in &self.translations {
            if t.language.trim().is_empty() {
                return Err(Error::InvalidData(format!(
                    "translation '{}' has no language",
                    t.name
                )));
            }
        }
        Ok(())
    }
}

impl FromRow<'_, SqliteRow> for Sample {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: Some(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            amount: row.try_get("amount")?,
            version: row.try_get("version")?,
            translations: Default::default(),
            created_at: row.try_get("created_at")?,
            created_by: row.try_get("created_by")?,
            last_modified_at: row.try_get("last_modified_at")?,
            last_modified_by: row.try_get("last_modified_by")?,
        })
    }
}

impl Translation {
    pub fn new(name: String, description: String, language: String, ordinal: i16) -> Self {
        Self {
            name,
            description,
            language,
            ordinal,
        }
    }
}

impl ChildRow for Translation {
    const COLUMNS: &'static [&'static str] = &["name", "description", "language", "ordinal"];

    fn values(&self) -> Vec<BindValue> {
        vec![
            self.name.as_str().into(),
            self.description.as_str().into(),
            self.language.as_str().into(),
            self.ordinal.into(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> Sample {
        Sample::new("Widget".into(), "A widget".into(), 9.99, "alice").with_translation(
            Translation::new("Widget".into(), "A widget".into(), "en".into(), 0),
        )
    }

    #[test]
    fn test_new_sample_is_unsaved() {
        let s = widget();
        assert_eq!(s.id, None);
        assert_eq!(s.created_by, "alice");
        assert_eq!(s.last_modified_by, "alice");
        assert!(s.created_at.is_none());
        assert_eq!(s.translations.len(), 1);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        let mut s = widget();
        s.name = "  ".into();
        assert!(matches!(s.validate(), Err(Error::InvalidData(_))));

        let mut s = widget();
        s.amount = f64::NAN;
        assert!(matches!(s.validate(), Err(Error::InvalidData(_))));

        let mut s = widget();
        s.created_by.clear();
        assert!(matches!(s.validate(), Err(Error::InvalidData(_))));

        let s = widget().with_translation(Translation::new(
            "Gadget".into(),
            "".into(),
            "".into(),
            1,
        ));
        assert!(matches!(s.validate(), Err(Error::InvalidData(_))));
    }

    fn with_translations(n: usize) -> Sample {
        let mut s = Sample::new("Many".into(), "".into(), 1.0, "alice");
        s.translations = (0..n)
            .map(|i| Translation::new(format!("name {i}"), "".into(), format!("l{i}"), 0))
            .collect();
        s
    }

    #[test]
    fn test_validate_translation_limit() {
        assert_eq!(MAX_TRANSLATIONS, 6553);
        assert!(with_translations(MAX_TRANSLATIONS).validate().is_ok());
        assert!(matches!(
            with_translations(MAX_TRANSLATIONS + 1).validate(),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_translation_values_follow_columns() {
        let t = Translation::new("Gadget".into(), "Un gadget".into(), "fr".into(), 2);
        assert_eq!(
            t.values(),
            vec![
                BindValue::Text("Gadget".into()),
                BindValue::Text("Un gadget".into()),
                BindValue::Text("fr".into()),
                BindValue::Integer(2),
            ]
        );
        assert_eq!(t.values().len(), Translation::COLUMNS.len());
    }
}
