use axum::body::Body;
use axum::http::Request;
use datahub_common::DATE_HEADER;
use datahub_common::auth::{Credentials, http_date};

/// Build a request signed by `credentials`; the signature covers the path without the query.
pub fn signed_request(
    credentials: &Credentials,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let path = uri.split('?').next().unwrap_or(uri);
    let date = http_date(chrono::Utc::now());
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(DATE_HEADER, date.as_str())
        .header(
            "authorization",
            credentials.authorization(method, path, &date),
        );
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub fn json_request(
    credentials: &Credentials,
    method: &str,
    uri: &str,
    body: serde_json::Value,
) -> Request<Body> {
    signed_request(credentials, method, uri, Some(body))
}
