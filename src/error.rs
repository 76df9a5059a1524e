// src/error.rs
use crate::{registry::RegistryError, repository::RepositoryError, versioning::VersionError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

// Error type of the HTTP layer; every handler returns it.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Repository(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            AppError::Repository(RepositoryError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Repository(_) => StatusCode::NOT_FOUND,
            AppError::Registry(RegistryError::Lookup(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Registry(_) => StatusCode::NOT_FOUND,
            AppError::Version(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = if status.is_server_error() {
            // Full details stay in the server log.
            tracing::error!("HTTP Handler Error: {}", self);
            "An internal error occurred".to_string()
        } else {
            tracing::warn!("HTTP {} : {}", status.as_u16(), self);
            self.to_string()
        };

        (status, error_message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_errors_to_status_codes() {
        let not_found = AppError::from(RepositoryError::UserNotFound(3));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let conflict = AppError::from(RepositoryError::Conflict("username already exists".into()));
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let missing_client = AppError::from(RegistryError::ClientNotFound("abc".into()));
        assert_eq!(missing_client.status(), StatusCode::NOT_FOUND);

        let bad = AppError::BadRequest("fontSize must be positive".into());
        assert_eq!(bad.into_response().status(), StatusCode::BAD_REQUEST);

        let db = AppError::from(RepositoryError::Database(sqlx::Error::PoolClosed));
        assert_eq!(db.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
