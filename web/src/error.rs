use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use libsample::ErrorKind;
use serde::Serialize;
use tracing::{error, warn};

#[derive(thiserror::Error, Debug)]
pub(crate) enum Error {
    #[error(transparent)]
    Libsample(#[from] libsample::Error),
    #[error("The request path was rejected: {0}")]
    UnprocessablePath(#[from] PathRejection),
    #[error("The request body was rejected: {0}")]
    UnprocessableBody(#[from] JsonRejection),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// The json body sent to clients for every error response
#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct ErrorBody {
    pub(crate) status: u16,
    pub(crate) message: String,
    pub(crate) resource: Option<String>,
    pub(crate) id: Option<i64>,
}

impl Error {
    pub(crate) fn to_client_status(&self) -> (StatusCode, ErrorBody) {
        let (status, message, resource, id) = match self {
            Error::Libsample(e) => match e.kind() {
                ErrorKind::NotFound => {
                    let (resource, id) = match e {
                        libsample::Error::ResourceNotFound { id, resource } => {
                            (Some(resource.clone()), Some(*id))
                        }
                        _ => (None, None),
                    };
                    (StatusCode::NOT_FOUND, e.to_string(), resource, id)
                }
                ErrorKind::Conflict => (
                    StatusCode::CONFLICT,
                    "The request conflicts with existing data".to_string(),
                    None,
                    None,
                ),
                ErrorKind::Validation => {
                    (StatusCode::UNPROCESSABLE_ENTITY, e.to_string(), None, None)
                }
                ErrorKind::Internal => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                    None,
                    None,
                ),
            },
            Error::UnprocessablePath(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "The request path was not in the expected format".to_string(),
                None,
                None,
            ),
            Error::UnprocessableBody(rejection) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                rejection.body_text(),
                None,
                None,
            ),
            Error::InvalidRequest(message) => {
                (StatusCode::UNPROCESSABLE_ENTITY, message.clone(), None, None)
            }
        };
        (
            status,
            ErrorBody {
                status: status.as_u16(),
                message,
                resource,
                id,
            },
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, body) = self.to_client_status();
        if status.is_server_error() {
            error!("Got error for response: {self:?}");
        } else {
            warn!("Got error for response: {self:?}");
        }
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_not_found_status() {
        let err: Error = libsample::Error::not_found(7, "/data/sample").into();
        let (status, body) = err.to_client_status();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.status, 404);
        assert_eq!(body.resource.as_deref(), Some("/data/sample"));
        assert_eq!(body.id, Some(7));
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err: Error = libsample::Error::Timeout(Duration::from_secs(3)).into();
        let (status, body) = err.to_client_status();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "Internal error");

        let err: Error = libsample::Error::from(sqlx::Error::PoolTimedOut).into();
        let (status, body) = err.to_client_status();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.message.contains("pool"));
    }

    #[test]
    fn test_validation_status() {
        let err: Error = libsample::Error::InvalidData("sample name must not be empty".into()).into();
        let (status, body) = err.to_client_status();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.message.contains("sample name must not be empty"));

        let err = Error::InvalidRequest("bad id".into());
        assert_eq!(err.to_client_status().0, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
