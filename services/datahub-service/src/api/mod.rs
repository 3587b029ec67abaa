//! DataHub HTTP API module.
//!
//! # Purpose
//! Route handler modules plus the small validation helpers they share.
pub mod error;
pub mod openapi;
pub mod projects;
pub mod subscriptions;
pub mod system;
pub mod topics;

use crate::api::error::{ApiError, api_invalid_parameter};
use datahub_common::MAX_COMMENT_CHARS;

pub(crate) fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

pub(crate) fn validate_comment(comment: &str) -> Result<(), ApiError> {
    if comment.chars().count() > MAX_COMMENT_CHARS {
        return Err(api_invalid_parameter(format!(
            "comment exceeds {MAX_COMMENT_CHARS} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_length_is_counted_in_chars() {
        assert!(validate_comment(&"é".repeat(MAX_COMMENT_CHARS)).is_ok());
        let err = validate_comment(&"x".repeat(MAX_COMMENT_CHARS + 1)).expect_err("too long");
        assert_eq!(err.body.error_code, "InvalidParameter");
    }
}
