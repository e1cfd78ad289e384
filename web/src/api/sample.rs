use crate::{error::Error, state::AppState};
use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use libsample::sample::{Sample, Translation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// The header that identifies the user making a change
pub(crate) const USER_HEADER: &str = "x-user-id";
const DEFAULT_USER: &str = "system";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(new_sample))
        .route("/{id}", get(show_sample).delete(delete_sample))
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TranslationResponse {
    name: String,
    description: String,
    language: String,
    ordinal: i16,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SampleResponse {
    id: Option<i64>,
    name: String,
    description: String,
    amount: f64,
    version: i16,
    translations: Vec<TranslationResponse>,
    #[serde(with = "time::serde::rfc3339::option")]
    created_at: Option<OffsetDateTime>,
    created_by: String,
    #[serde(with = "time::serde::rfc3339::option")]
    last_modified_at: Option<OffsetDateTime>,
    last_modified_by: String,
}

impl From<Translation> for TranslationResponse {
    fn from(t: Translation) -> Self {
        Self {
            name: t.name,
            description: t.description,
            language: t.language,
            ordinal: t.ordinal,
        }
    }
}

impl From<Sample> for SampleResponse {
    fn from(s: Sample) -> Self {
        Self {
            id: s.id,
            name: s.name,
            description: s.description,
            amount: s.amount,
            version: s.version,
            translations: s.translations.into_iter().map(Into::into).collect(),
            created_at: s.created_at,
            created_by: s.created_by,
            last_modified_at: s.last_modified_at,
            last_modified_by: s.last_modified_by,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct TranslationParams {
    name: String,
    #[serde(default)]
    description: String,
    language: String,
    #[serde(default)]
    ordinal: i16,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SampleParams {
    name: String,
    #[serde(default)]
    description: String,
    amount: f64,
    #[serde(default)]
    translations: Vec<TranslationParams>,
}

fn acting_user(headers: &HeaderMap) -> Result<String, Error> {
    match headers.get(USER_HEADER) {
        None => Ok(DEFAULT_USER.to_string()),
        Some(value) => {
            let user = value
                .to_str()
                .map_err(|_| Error::InvalidRequest(format!("Invalid '{USER_HEADER}' header")))?
                .trim();
            if user.is_empty() {
                return Err(Error::InvalidRequest(format!(
                    "Empty '{USER_HEADER}' header"
                )));
            }
            Ok(user.to_string())
        }
    }
}

fn sample_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, Error> {
    let Path(id) = path?;
    if id <= 0 {
        return Err(Error::InvalidRequest(format!(
            "Sample id must be a positive number, got {id}"
        )));
    }
    Ok(id)
}

async fn show_sample(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<SampleResponse>, Error> {
    let id = sample_id(path)?;
    let sample = state.samples.get(id).await?;
    Ok(Json(sample.into()))
}

async fn new_sample(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: Result<Json<SampleParams>, JsonRejection>,
) -> Result<(StatusCode, Json<SampleResponse>), Error> {
    let user = acting_user(&headers)?;
    let Json(params) = params?;
    let mut sample = Sample::new(params.name, params.description, params.amount, &user);
    sample.translations = params
        .translations
        .into_iter()
        .map(|t| Translation::new(t.name, t.description, t.language, t.ordinal))
        .collect();
    let sample = state.samples.create(sample).await?;
    Ok((StatusCode::CREATED, Json(sample.into())))
}

async fn delete_sample(
    State(state): State<AppState>,
    headers: HeaderMap,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, Error> {
    let id = sample_id(path)?;
    let user = acting_user(&headers)?;
    state.samples.delete(id, &user).await?;
    Ok(StatusCode::NO_CONTENT)
}
