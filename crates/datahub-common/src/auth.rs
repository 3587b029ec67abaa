//! Request signing shared by the SDK (which signs) and the service (which verifies).
//!
//! A request is signed over `METHOD\npath\ndate` with HMAC-SHA256 keyed by the
//! caller's access key. The signature travels as
//! `Authorization: DATAHUB <access_id>:<base64 signature>` next to the
//! `x-datahub-date` header it covers.
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac, digest::KeyInit};
use sha2::Sha256;
use std::fmt;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const AUTH_SCHEME: &str = "DATAHUB";
/// Dates further than this from the verifier's clock are rejected.
pub const MAX_CLOCK_SKEW_SECS: i64 = 15 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing {0} header")]
    MissingHeader(&'static str),
    #[error("malformed authorization header")]
    MalformedAuthorization,
    #[error("unknown access id: {0}")]
    UnknownAccessId(String),
    #[error("signature mismatch")]
    SignatureMismatch,
    #[error("invalid request date: {0}")]
    InvalidDate(String),
    #[error("request date outside allowed clock skew")]
    DateSkew,
}

/// Access id/key pair. `Debug` never prints the key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_id: String,
    pub access_key: String,
}

impl Credentials {
    pub fn new(access_id: impl Into<String>, access_key: impl Into<String>) -> Self {
        Self {
            access_id: access_id.into(),
            access_key: access_key.into(),
        }
    }

    /// Build the `Authorization` header value for one request.
    pub fn authorization(&self, method: &str, path: &str, date: &str) -> String {
        let signature = sign(&self.access_key, &canonical_request(method, path, date));
        format!("{AUTH_SCHEME} {}:{signature}", self.access_id)
    }

    /// Key with everything but the first and last two characters hidden.
    pub fn masked_key(&self) -> String {
        mask(&self.access_key)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_id", &self.access_id)
            .field("access_key", &self.masked_key())
            .finish()
    }
}

pub fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}{}{tail}", "*".repeat(chars.len() - 4))
}

pub fn canonical_request(method: &str, path: &str, date: &str) -> String {
    format!("{}\n{}\n{}", method.to_ascii_uppercase(), path, date)
}

pub fn sign(access_key: &str, canonical: &str) -> String {
    BASE64.encode(mac(access_key, canonical).finalize().into_bytes())
}

pub fn http_date(now: DateTime<Utc>) -> String {
    now.to_rfc2822()
}

/// Split `DATAHUB <id>:<signature>` into its id and signature.
pub fn parse_authorization(value: &str) -> Result<(&str, &str), SignatureError> {
    let rest = value
        .strip_prefix(AUTH_SCHEME)
        .and_then(|rest| rest.strip_prefix(' '))
        .ok_or(SignatureError::MalformedAuthorization)?;
    let (access_id, signature) = rest
        .split_once(':')
        .ok_or(SignatureError::MalformedAuthorization)?;
    if access_id.is_empty() || signature.is_empty() {
        return Err(SignatureError::MalformedAuthorization);
    }
    Ok((access_id, signature))
}

/// Verify a signed request and return the caller's access id.
///
/// `lookup` resolves an access id to its key.
pub fn verify_request<F>(
    lookup: F,
    method: &str,
    path: &str,
    authorization: Option<&str>,
    date: Option<&str>,
    now: DateTime<Utc>,
) -> Result<String, SignatureError>
where
    F: Fn(&str) -> Option<String>,
{
    let authorization = authorization.ok_or(SignatureError::MissingHeader("authorization"))?;
    let date = date.ok_or(SignatureError::MissingHeader(crate::DATE_HEADER))?;
    let signed_at = DateTime::parse_from_rfc2822(date)
        .map_err(|err| SignatureError::InvalidDate(err.to_string()))?;
    if (now.timestamp() - signed_at.timestamp()).abs() > MAX_CLOCK_SKEW_SECS {
        return Err(SignatureError::DateSkew);
    }
    let (access_id, signature) = parse_authorization(authorization)?;
    let access_key =
        lookup(access_id).ok_or_else(|| SignatureError::UnknownAccessId(access_id.to_string()))?;
    let provided = BASE64
        .decode(signature)
        .map_err(|_| SignatureError::MalformedAuthorization)?;
    mac(&access_key, &canonical_request(method, path, date))
        .verify_slice(&provided)
        .map_err(|_| SignatureError::SignatureMismatch)?;
    Ok(access_id.to_string())
}

fn mac(access_key: &str, canonical: &str) -> HmacSha256 {
    let mut mac = <HmacSha256 as KeyInit>::new_from_slice(access_key.as_bytes())
        .expect("hmac accepts keys of any length");
    mac.update(canonical.as_bytes());
    mac
}
