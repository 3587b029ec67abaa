//! API error types and helpers.
//!
//! # Purpose and responsibility
//! Builds the `{ErrorCode, ErrorMessage, RequestId}` bodies every endpoint returns on failure
//! and maps store failures and extractor rejections onto DataHub error codes.
//!
//! # Key invariants
//! - The HTTP status is derived from the error code, never chosen independently.
//! - Internal errors are logged server-side and reported with a generic message.
//! - The rendered body is also attached to the response extensions so the request-id
//!   middleware can stamp `RequestId` into it.
use crate::store::{ResourceKind, StoreError};
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use datahub_common::{ErrorCode, ErrorResponse};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: status_for(code),
            body: ErrorResponse {
                error_code: code.as_str().to_string(),
                error_message: message.into(),
                request_id: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body.clone())).into_response();
        response.extensions_mut().insert(self.body);
        response
    }
}

/// HTTP status the service uses for each error code.
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::ResourceAlreadyExist | ErrorCode::InvalidOperation => StatusCode::CONFLICT,
        ErrorCode::NoSuchProject | ErrorCode::NoSuchTopic | ErrorCode::NoSuchSubscription => {
            StatusCode::NOT_FOUND
        }
        ErrorCode::InvalidParameter => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn api_invalid_parameter(message: impl Into<String>) -> ApiError {
    ApiError::new(ErrorCode::InvalidParameter, message)
}

pub fn api_unauthorized(message: impl Into<String>) -> ApiError {
    ApiError::new(ErrorCode::Unauthorized, message)
}

/// Translate a store failure into the matching DataHub error.
pub fn api_store_error(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound(kind, name) => {
            let code = match kind {
                ResourceKind::Project => ErrorCode::NoSuchProject,
                ResourceKind::Topic => ErrorCode::NoSuchTopic,
                ResourceKind::Subscription => ErrorCode::NoSuchSubscription,
            };
            ApiError::new(code, format!("The specified {kind} {name} does not exist."))
        }
        StoreError::Conflict(kind, name) => ApiError::new(
            ErrorCode::ResourceAlreadyExist,
            format!("The {kind} {name} already exists."),
        ),
        StoreError::NotEmpty(kind, name) => {
            let children = match kind {
                ResourceKind::Project => "topics",
                ResourceKind::Topic | ResourceKind::Subscription => "subscriptions",
            };
            ApiError::new(
                ErrorCode::InvalidOperation,
                format!("The {kind} {name} still has {children}."),
            )
        }
        StoreError::Unexpected(err) => {
            tracing::error!(error = ?err, "datahub storage error");
            ApiError::new(ErrorCode::InternalServerError, "internal storage error")
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        api_store_error(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        api_invalid_parameter(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        api_invalid_parameter(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        api_invalid_parameter(rejection.body_text())
    }
}
