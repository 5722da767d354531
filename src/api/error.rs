use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use crate::error::GovernanceError;

use super::response::ErrorResponse;

/// Error type returned by handlers.
#[derive(Debug)]
pub struct ApiError(pub GovernanceError);

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            GovernanceError::Validation(_) | GovernanceError::RuleParam(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            GovernanceError::NotFound(_) => StatusCode::NOT_FOUND,
            GovernanceError::Conflict(_) => StatusCode::CONFLICT,
            GovernanceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.0.code();

        let message = match &self.0 {
            GovernanceError::Storage(e) => {
                error!(error = %format!("{e:#}"), "Request failed on storage");
                "Internal storage error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorResponse::new(message, code))).into_response()
    }
}

impl From<GovernanceError> for ApiError {
    fn from(err: GovernanceError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(GovernanceError::validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(GovernanceError::validation(rejection.body_text()))
    }
}
