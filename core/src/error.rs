//! Error types for the requestor client.
//!
//! # Design
//! Only transport failures, non-2xx statuses and cookie-jar read failures
//! ever reach the caller of a dispatch. Cache passback and cookie-write
//! failures are side effects: they are logged and published as
//! diagnostics, never returned. `Status` keeps the numeric status apart
//! from the message so callers can branch on it without parsing text.

use thiserror::Error;

/// Errors returned by `RequestorClient` construction and dispatch.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configuration argument was not a mapping, or a section had the
    /// wrong shape.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The method name passed to `dispatch` is not a known HTTP method.
    #[error("unknown request method: {0}")]
    UnknownMethod(String),

    /// The engine failed before producing a response. Forwarded untouched.
    #[error(transparent)]
    Transport(#[from] EngineError),

    /// The engine answered with a status outside 200..=299.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// Reading the cookie string from an asynchronous jar failed, so the
    /// engine was never contacted.
    #[error("cookie jar read failed: {0}")]
    CookieRead(#[source] JarError),

    /// A cache hit flagged as processed did not hold valid JSON.
    #[error("cached body is not valid JSON: {0}")]
    CachedBody(#[from] serde_json::Error),
}

impl ClientError {
    /// HTTP status carried by a `Status` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure reported by the underlying request engine.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct EngineError {
    message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure reported by a cookie store.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct JarError(pub String);

/// Failure reported while writing a parsed body back into the cache.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct CacheError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_displays_message_only() {
        let err = ClientError::Status {
            status: 404,
            message: r#"{"error":"missing"}"#.to_string(),
        };
        assert_eq!(err.to_string(), r#"{"error":"missing"}"#);
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn transport_error_is_forwarded_verbatim() {
        let err: ClientError = EngineError::new("connection refused").into();
        assert_eq!(err.to_string(), "connection refused");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn cookie_read_error_keeps_source() {
        let err = ClientError::CookieRead(JarError("store offline".to_string()));
        assert_eq!(err.to_string(), "cookie jar read failed: store offline");
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("store offline"));
    }
}
