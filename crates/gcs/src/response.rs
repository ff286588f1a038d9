//! Response decoding and status mapping
//!
//! Callers state how a body should be read with [`ContentPolicy`]; nothing
//! here inspects content types or file extensions to guess.

use bytes::Bytes;
use gsz_core::{Error, Result};
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// How to decode a successful response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentPolicy {
    Json,
    Text,
    Bytes,
}

/// A decoded response body
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Text(String),
    Bytes(Bytes),
}

impl Body {
    /// Decode raw bytes according to `policy`
    pub fn decode(raw: Bytes, policy: ContentPolicy) -> Result<Self> {
        Ok(match policy {
            ContentPolicy::Json if raw.iter().all(u8::is_ascii_whitespace) => Body::Json(Value::Null),
            ContentPolicy::Json => Body::Json(serde_json::from_slice(&raw)?),
            ContentPolicy::Text => Body::Text(
                String::from_utf8(raw.to_vec())
                    .map_err(|e| Error::General(format!("Response is not valid UTF-8: {e}")))?,
            ),
            ContentPolicy::Bytes => Body::Bytes(raw),
        })
    }

    /// Deserialize a JSON body into `T`
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T> {
        match self {
            Body::Json(value) => Ok(serde_json::from_value(value)?),
            Body::Text(text) => Ok(serde_json::from_str(&text)?),
            Body::Bytes(bytes) => Ok(serde_json::from_slice(&bytes)?),
        }
    }

    pub fn into_bytes(self) -> Bytes {
        match self {
            Body::Json(value) => Bytes::from(value.to_string()),
            Body::Text(text) => Bytes::from(text),
            Body::Bytes(bytes) => bytes,
        }
    }
}

/// Pull `error.message` out of a JSON error body, falling back to the raw text
pub fn error_message(body: &[u8]) -> Option<String> {
    if let Ok(value) = serde_json::from_slice::<Value>(body)
        && let Some(message) = value
            .get("error")
            .and_then(|e| e.get("message").or(Some(e)))
            .and_then(Value::as_str)
    {
        return Some(message.to_string());
    }

    let text = String::from_utf8_lossy(body).trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Map an unsuccessful status to an error
pub fn status_error(status: StatusCode, body: &[u8], context: &str) -> Error {
    let detail = error_message(body)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_default();
    let message = format!("{context}: {detail}");

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Auth(message),
        StatusCode::NOT_FOUND => Error::NotFound(context.to_string()),
        StatusCode::CONFLICT => Error::Conflict(message),
        _ => Error::Http {
            status: status.as_u16(),
            message,
        },
    }
}

/// Map a transport failure to `Error::Network`
pub fn transport_error(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::Network(format!("request timed out: {error}"))
    } else if error.is_connect() {
        Error::Network(format!("connection refused: {error}"))
    } else {
        Error::Network(error.to_string())
    }
}
