//! Client error surface.
//!
//! Service failures are classified by the `ErrorCode` in the response body so
//! callers can tolerate the expected ones (`ResourceExist` on create,
//! `InvalidOperation` on project delete) and propagate the rest.
use datahub_common::{ErrorCode, ErrorResponse};
use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

/// Error details reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    pub status: u16,
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.status, self.message)?;
        if let Some(request_id) = &self.request_id {
            write!(f, " [request {request_id}]")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum DatahubError {
    #[error("resource already exists: {0}")]
    ResourceExist(ServiceError),
    #[error("resource not found: {0}")]
    ResourceNotFound(ServiceError),
    #[error("invalid parameter: {0}")]
    InvalidParameter(ServiceError),
    #[error("invalid operation: {0}")]
    InvalidOperation(ServiceError),
    #[error("unauthorized: {0}")]
    Unauthorized(ServiceError),
    #[error("service error: {0}")]
    Service(ServiceError),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Model(#[from] datahub_common::Error),
}

pub type Result<T> = std::result::Result<T, DatahubError>;

impl DatahubError {
    pub fn is_resource_exist(&self) -> bool {
        matches!(self, DatahubError::ResourceExist(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DatahubError::ResourceNotFound(_))
    }

    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, DatahubError::InvalidParameter(_))
    }

    pub fn is_invalid_operation(&self) -> bool {
        matches!(self, DatahubError::InvalidOperation(_))
    }

    /// Service-side details, when the error came from an error response.
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self {
            DatahubError::ResourceExist(err)
            | DatahubError::ResourceNotFound(err)
            | DatahubError::InvalidParameter(err)
            | DatahubError::InvalidOperation(err)
            | DatahubError::Unauthorized(err)
            | DatahubError::Service(err) => Some(err),
            _ => None,
        }
    }
}

/// Classify a non-success response from its status, request id and raw body.
pub(crate) fn error_from_parts(
    status: StatusCode,
    request_id: Option<String>,
    body: &[u8],
) -> DatahubError {
    let (code, message, body_request_id) = match serde_json::from_slice::<ErrorResponse>(body) {
        Ok(parsed) => (parsed.error_code, parsed.error_message, parsed.request_id),
        Err(_) => (
            fallback_code(status).to_string(),
            String::from_utf8_lossy(body).trim().to_string(),
            None,
        ),
    };
    let err = ServiceError {
        status: status.as_u16(),
        code,
        message,
        request_id: request_id.or(body_request_id),
    };
    match err.code.parse::<ErrorCode>() {
        Ok(ErrorCode::ResourceAlreadyExist) => DatahubError::ResourceExist(err),
        Ok(code) if code.is_not_found() => DatahubError::ResourceNotFound(err),
        Ok(ErrorCode::InvalidParameter) => DatahubError::InvalidParameter(err),
        Ok(ErrorCode::InvalidOperation) => DatahubError::InvalidOperation(err),
        Ok(ErrorCode::Unauthorized) => DatahubError::Unauthorized(err),
        _ => DatahubError::Service(err),
    }
}

fn fallback_code(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => ErrorCode::InvalidParameter.as_str(),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorCode::Unauthorized.as_str(),
        _ => ErrorCode::InternalServerError.as_str(),
    }
}
