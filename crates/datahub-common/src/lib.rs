// Shared DataHub wire types and small helpers used by the client SDK and the service.
use std::fmt;
use std::str::FromStr;

pub mod auth;
pub mod model;
pub mod schema;

pub use model::{
    CreateProjectRequest, CreateSubscriptionRequest, CreateSubscriptionResult, CreateTopicRequest,
    ErrorResponse, ListProjectResult, ListSubscriptionResult, ListTopicResult, Project,
    Subscription, SubscriptionState, Topic, UpdateProjectRequest, UpdateSubscriptionRequest,
    UpdateSubscriptionStateRequest,
};
pub use schema::{Field, FieldType, RecordSchema, RecordType};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid {kind} name: {name}")]
    InvalidName { kind: &'static str, name: String },
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    #[error("unknown error code: {0}")]
    UnknownErrorCode(String),
}

/// Response header carrying the service-assigned request id.
pub const REQUEST_ID_HEADER: &str = "x-datahub-request-id";
/// Request header carrying the RFC 2822 date covered by the signature.
pub const DATE_HEADER: &str = "x-datahub-date";
/// Largest page the service hands out for subscription listings.
pub const MAX_PAGE_SIZE: i64 = 100;
/// Type code of subscriptions created through the public API.
pub const USER_SUBSCRIPTION_TYPE: i32 = 0;
pub const MAX_COMMENT_CHARS: usize = 1024;

/// Error codes returned in the `ErrorCode` field of service error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ResourceAlreadyExist,
    NoSuchProject,
    NoSuchTopic,
    NoSuchSubscription,
    InvalidParameter,
    InvalidOperation,
    Unauthorized,
    InternalServerError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ResourceAlreadyExist => "ResourceAlreadyExist",
            ErrorCode::NoSuchProject => "NoSuchProject",
            ErrorCode::NoSuchTopic => "NoSuchTopic",
            ErrorCode::NoSuchSubscription => "NoSuchSubscription",
            ErrorCode::InvalidParameter => "InvalidParameter",
            ErrorCode::InvalidOperation => "InvalidOperation",
            ErrorCode::Unauthorized => "Unauthorized",
            ErrorCode::InternalServerError => "InternalServerError",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ErrorCode::NoSuchProject | ErrorCode::NoSuchTopic | ErrorCode::NoSuchSubscription
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        let code = match input {
            "ResourceAlreadyExist" => ErrorCode::ResourceAlreadyExist,
            "NoSuchProject" => ErrorCode::NoSuchProject,
            "NoSuchTopic" => ErrorCode::NoSuchTopic,
            "NoSuchSubscription" => ErrorCode::NoSuchSubscription,
            "InvalidParameter" => ErrorCode::InvalidParameter,
            "InvalidOperation" => ErrorCode::InvalidOperation,
            "Unauthorized" => ErrorCode::Unauthorized,
            "InternalServerError" => ErrorCode::InternalServerError,
            other => return Err(Error::UnknownErrorCode(other.to_string())),
        };
        Ok(code)
    }
}

pub mod names {
    // Resource naming rules enforced by the service and checked early by tooling.
    use super::{Error, Result};

    pub const PROJECT_NAME_MIN: usize = 3;
    pub const PROJECT_NAME_MAX: usize = 32;
    pub const TOPIC_NAME_MIN: usize = 1;
    pub const TOPIC_NAME_MAX: usize = 128;

    pub fn validate_project_name(name: &str) -> Result<()> {
        validate(name, "project", PROJECT_NAME_MIN, PROJECT_NAME_MAX)
    }

    pub fn validate_topic_name(name: &str) -> Result<()> {
        validate(name, "topic", TOPIC_NAME_MIN, TOPIC_NAME_MAX)
    }

    fn validate(name: &str, kind: &'static str, min: usize, max: usize) -> Result<()> {
        let invalid = || Error::InvalidName {
            kind,
            name: name.to_string(),
        };
        if name.len() < min || name.len() > max {
            return Err(invalid());
        }
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() => {}
            _ => return Err(invalid()),
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(invalid());
        }
        Ok(())
    }
}
