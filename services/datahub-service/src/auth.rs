//! Request authentication and request-id stamping.
//!
//! # Purpose
//! Every API request is signed with an access key (see `datahub_common::auth`). The
//! `authenticate` middleware verifies the signature against the configured accounts and
//! attaches the resulting [`Caller`] to the request; handlers read it to record and report
//! subscription ownership.
//!
//! `assign_request_id` wraps the whole router so every response, including authentication
//! failures, carries `x-datahub-request-id` and error bodies echo it as `RequestId`.
//!
//! # Security considerations
//! - Access keys never appear in logs; only access ids and failure reasons are recorded.
//! - Failures are reported uniformly as `Unauthorized` without saying which check failed.
use crate::api::error::api_unauthorized;
use crate::app::AppState;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_LENGTH};
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use datahub_common::auth::{Credentials, SignatureError, verify_request};
use datahub_common::{DATE_HEADER, ErrorResponse, REQUEST_ID_HEADER};
use std::collections::HashMap;

/// Access id to access key lookup for every account the service accepts.
#[derive(Debug, Default)]
pub struct AccountRegistry {
    keys: HashMap<String, String>,
}

impl AccountRegistry {
    pub fn new(accounts: &[Credentials]) -> Self {
        let keys = accounts
            .iter()
            .map(|account| (account.access_id.clone(), account.access_key.clone()))
            .collect();
        Self { keys }
    }

    pub fn lookup(&self, access_id: &str) -> Option<String> {
        self.keys.get(access_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// The authenticated account behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub access_id: String,
}

/// Service-assigned id of the request being handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

fn failure_reason(err: &SignatureError) -> &'static str {
    match err {
        SignatureError::MissingHeader(_) => "missing_header",
        SignatureError::MalformedAuthorization => "malformed",
        SignatureError::UnknownAccessId(_) => "unknown_access_id",
        SignatureError::SignatureMismatch => "signature_mismatch",
        SignatureError::InvalidDate(_) => "invalid_date",
        SignatureError::DateSkew => "date_skew",
    }
}

pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    // The header borrow must end before the request moves into `next`.
    let verified = {
        let header = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
        };
        verify_request(
            |access_id| state.accounts.lookup(access_id),
            request.method().as_str(),
            request.uri().path(),
            header(AUTHORIZATION.as_str()),
            header(DATE_HEADER),
            chrono::Utc::now(),
        )
    };
    match verified {
        Ok(access_id) => {
            request.extensions_mut().insert(Caller { access_id });
            next.run(request).await
        }
        Err(err) => {
            let reason = failure_reason(&err);
            tracing::warn!(error = %err, reason, path = %request.uri().path(), "request rejected");
            metrics::counter!("datahub_auth_failures_total", "reason" => reason).increment(1);
            api_unauthorized("The request signature could not be verified.").into_response()
        }
    }
}

pub async fn assign_request_id(mut request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().simple().to_string();
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));
    let mut response = next.run(request).await;

    if let Some(mut body) = response.extensions_mut().remove::<ErrorResponse>() {
        body.request_id = Some(request_id.clone());
        if let Ok(bytes) = serde_json::to_vec(&body) {
            let (mut parts, _) = response.into_parts();
            parts.headers.remove(CONTENT_LENGTH);
            response = Response::from_parts(parts, Body::from(bytes));
        }
    }
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Extension;

    #[test]
    fn registry_resolves_configured_keys() {
        let registry = AccountRegistry::new(&[
            Credentials::new("id-a", "key-a"),
            Credentials::new("id-b", "key-b"),
        ]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup("id-b").as_deref(), Some("key-b"));
        assert!(registry.lookup("id-c").is_none());
    }

    #[test]
    fn failure_reasons_are_stable_labels() {
        assert_eq!(
            failure_reason(&SignatureError::MissingHeader("authorization")),
            "missing_header"
        );
        assert_eq!(failure_reason(&SignatureError::DateSkew), "date_skew");
        assert_eq!(
            failure_reason(&SignatureError::UnknownAccessId("x".into())),
            "unknown_access_id"
        );
    }

    fn whoami_router() -> axum::Router {
        let state = AppState::in_memory(&crate::config::ServiceConfig::local("id-a", "key-a"));
        axum::Router::new()
            .route(
                "/whoami",
                axum::routing::get(|Extension(caller): Extension<Caller>| async move {
                    caller.access_id
                }),
            )
            .route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                authenticate,
            ))
            .with_state(state)
    }

    #[tokio::test]
    async fn verified_caller_reaches_the_handler() {
        use tower::ServiceExt;

        let date = datahub_common::auth::http_date(chrono::Utc::now());
        let authorization = Credentials::new("id-a", "key-a").authorization("GET", "/whoami", &date);
        let request = Request::builder()
            .uri("/whoami")
            .header(DATE_HEADER, date.as_str())
            .header(AUTHORIZATION, authorization)
            .body(Body::empty())
            .expect("request");
        let response = whoami_router().oneshot(request).await.expect("response");
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        assert_eq!(&bytes[..], b"id-a");
    }

    #[tokio::test]
    async fn unsigned_request_never_reaches_the_handler() {
        use tower::ServiceExt;

        let request = Request::builder()
            .uri("/whoami")
            .body(Body::empty())
            .expect("request");
        let response = whoami_router().oneshot(request).await.expect("response");
        assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
