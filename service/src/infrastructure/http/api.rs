use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::domain::repository::RepositoryError;

// ApiSuccess is a wrapper around a response that includes a status code.

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize>(StatusCode, Json<T>);

impl<T: Serialize> ApiSuccess<T> {
    pub(crate) fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(data))
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

// ApiError is a wrapper around a response that includes a status code.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    BadRequest(String),
    ConflictWithServerState(String),
    NotFound,
    Unauthorized,
    Forbidden,
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::InternalServerError(e.to_string())
    }
}

impl From<RepositoryError> for ApiError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::ValidationFailed(cause) => Self::BadRequest(cause),
            RepositoryError::Conflict(cause) => Self::ConflictWithServerState(cause),
            RepositoryError::UniqueViolation(cause) => Self::ConflictWithServerState(cause),
            RepositoryError::DatabaseError(cause) => {
                tracing::error!("{:?}", cause);
                Self::InternalServerError("Database server error".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use ApiError::*;

        match self {
            InternalServerError(e) => {
                tracing::error!("{}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponseBody::new_error(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )),
                )
                    .into_response()
            }
            BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(ApiResponseBody::new_error(StatusCode::BAD_REQUEST, message)),
            )
                .into_response(),
            ConflictWithServerState(message) => (
                StatusCode::CONFLICT,
                Json(ApiResponseBody::new_error(StatusCode::CONFLICT, message)),
            )
                .into_response(),
            NotFound => (
                StatusCode::NOT_FOUND,
                Json(ApiResponseBody::new_error(
                    StatusCode::NOT_FOUND,
                    "Not found".to_string(),
                )),
            )
                .into_response(),
            Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponseBody::new_error(
                    StatusCode::UNAUTHORIZED,
                    "Missing or invalid bearer token".to_string(),
                )),
            )
                .into_response(),
            Forbidden => (
                StatusCode::FORBIDDEN,
                Json(ApiResponseBody::new_error(
                    StatusCode::FORBIDDEN,
                    "Insufficient role".to_string(),
                )),
            )
                .into_response(),
        }
    }
}

// Generic response structure shared by all API responses.

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    pub status_code: u16,
    pub data: T,
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { message },
        }
    }
}

/// The response data format for all error responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
}
