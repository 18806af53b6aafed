//! Error types for the Bitfinex client library.
//!
//! [`BitfinexError`] is the crate-wide error. Errors reported by the exchange
//! itself are normalized into a [`ServerError`] regardless of which envelope
//! shape the server used.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// The main error type for all Bitfinex client operations.
#[derive(Error, Debug)]
pub enum BitfinexError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP request with middleware failed
    #[error("HTTP request failed: {0}")]
    HttpMiddleware(#[from] reqwest_middleware::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Query string encoding error
    #[error("Query encoding error: {0}")]
    QueryEncoding(#[from] serde_urlencoded::ser::Error),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// Bitfinex API returned an error
    #[error("Bitfinex API error (HTTP {status}): {error}")]
    Api {
        /// HTTP status of the response carrying the error
        status: StatusCode,
        /// The normalized error payload
        error: ServerError,
    },

    /// Client misconfiguration, such as invalid credentials
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid response from the API
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Missing required credentials
    #[error("Missing credentials: API key and secret required for signed endpoints")]
    MissingCredentials,
}

impl BitfinexError {
    /// The normalized server error, if this error came from the exchange.
    pub fn server_error(&self) -> Option<&ServerError> {
        match self {
            Self::Api { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// An error reported by Bitfinex, normalized across envelope shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    /// Numeric error code, when the envelope carried one
    pub code: Option<i64>,
    /// Human-readable error message
    pub message: String,
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "{}: {}", code, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl ServerError {
    /// Create a new server error from an optional code and a message.
    pub fn new(code: Option<i64>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Normalize a parsed error body.
    ///
    /// Shapes are tried in order:
    ///
    /// 1. The array envelope `["error", code, message]` (or a bare `[code, message]`)
    /// 2. An object with `error`, `code` and `error_description`
    /// 3. An object with `message`
    /// 4. Anything else, stringified
    ///
    /// This never fails; some diagnostic message is always produced.
    pub fn from_response(body: &Value, status: StatusCode) -> Self {
        let error = match body {
            Value::Array(items) => Self::from_array(items)
                .unwrap_or_else(|| Self::new(None, body.to_string())),
            Value::Object(fields) => {
                match (
                    fields.get("error"),
                    fields.get("code"),
                    fields.get("error_description"),
                ) {
                    (Some(error), Some(code), Some(description)) => Self::new(
                        parse_code(code),
                        format!("{}: {}", render(error), render(description)),
                    ),
                    _ => match fields.get("message") {
                        Some(message) => Self::new(None, render(message)),
                        None => Self::new(None, body.to_string()),
                    },
                }
            }
            Value::Null => Self::new(None, status_line(status)),
            Value::String(text) if text.trim().is_empty() => {
                Self::new(None, status_line(status))
            }
            other => Self::new(None, render(other)),
        };

        tracing::debug!(
            status = status.as_u16(),
            code = ?error.code,
            "Normalized error response"
        );
        error
    }

    /// Normalize a raw response body.
    ///
    /// Bodies that are not JSON (plain-text gateway errors, for example)
    /// become the message verbatim.
    pub fn from_raw(raw: &str, status: StatusCode) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(body) => Self::from_response(&body, status),
            Err(_) if raw.trim().is_empty() => Self::new(None, status_line(status)),
            Err(_) => Self::new(None, raw.trim()),
        }
    }

    /// Detect the v2 error envelope inside an otherwise successful response.
    ///
    /// Returns `None` unless the body is an array whose first element is the
    /// literal `"error"`.
    pub fn from_envelope(body: &Value) -> Option<Self> {
        match body {
            Value::Array(items) if items.first().and_then(Value::as_str) == Some("error") => {
                Self::from_array(items)
            }
            _ => None,
        }
    }

    fn from_array(items: &[Value]) -> Option<Self> {
        match items {
            [Value::String(tag), code, rest @ ..] if tag == "error" => {
                Some(Self::new(parse_code(code), array_message(rest.first(), items)))
            }
            [code @ Value::Number(_), message, ..] => {
                Some(Self::new(parse_code(code), array_message(Some(message), items)))
            }
            _ => None,
        }
    }

    /// Check if the server rejected the nonce as not increasing.
    pub fn is_invalid_nonce(&self) -> bool {
        self.code == Some(error_codes::NONCE_SMALL) || self.message.contains("nonce")
    }

    /// Check if this is an authentication failure (key, payload, signature or nonce).
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self.code,
            Some(code) if (error_codes::AUTH_FAIL..=error_codes::NONCE_SMALL).contains(&code)
        )
    }

    /// Check if this is a rate limit error.
    pub fn is_rate_limit(&self) -> bool {
        self.code == Some(error_codes::RATE_LIMIT) || self.message.contains("ratelimit")
    }
}

fn parse_code(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// The positional message, or the whole envelope when it is missing or blank.
fn array_message(message: Option<&Value>, items: &[Value]) -> String {
    match message.map(render) {
        Some(text) if !text.trim().is_empty() => text,
        _ => Value::Array(items.to_vec()).to_string(),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("HTTP {} {}", status.as_u16(), reason),
        None => format!("HTTP {}", status.as_u16()),
    }
}

/// Known Bitfinex error codes for pattern matching.
pub mod error_codes {
    /// Unknown error
    pub const UNKNOWN: i64 = 10000;
    /// Generic error
    pub const GENERIC: i64 = 10001;
    /// Invalid request parameters
    pub const PARAMS: i64 = 10020;
    /// Authentication failure
    pub const AUTH_FAIL: i64 = 10100;
    /// Invalid authentication payload
    pub const AUTH_PAYLOAD: i64 = 10111;
    /// Invalid signature
    pub const AUTH_SIGNATURE: i64 = 10112;
    /// Invalid HMAC
    pub const AUTH_HMAC: i64 = 10113;
    /// Nonce smaller than the last one accepted
    pub const NONCE_SMALL: i64 = 10114;
    /// Rate limit exceeded
    pub const RATE_LIMIT: i64 = 11010;
}
