//! HTTP value types exchanged with the engine.
//!
//! # Design
//! Requests and responses are plain data. The engine owns transport,
//! caching and throttling; this crate only inspects what it hands back.
//! Headers are kept as ordered `(name, value)` pairs because a response may
//! repeat a header (`Set-Cookie` in particular) and lookups must ignore case.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use url::Url;

use crate::error::ClientError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            _ => Err(ClientError::UnknownMethod(s.to_string())),
        }
    }
}

/// A response body, either raw text or an already-deserialized value.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Text(String),
    Json(Value),
}

impl Body {
    /// Text used as the message of a status error: structured bodies are
    /// JSON-encoded, text bodies are taken as they are.
    pub fn to_message(&self) -> String {
        match self {
            Body::Text(text) => text.clone(),
            Body::Json(Value::String(text)) => text.clone(),
            Body::Json(value) => value.to_string(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(text) => Some(text),
            Body::Json(_) => None,
        }
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

/// Everything about a response except its body.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseHead {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// Served by the engine's cache layer.
    pub from_cache: bool,
    /// The cached body is the JSON form of a value parsed on an earlier pass.
    pub processed: bool,
    /// URI the request finally resolved to, after redirects.
    pub request_uri: Option<Url>,
}

impl ResponseHead {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            from_cache: false,
            processed: false,
            request_uri: None,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// First value of the named header, compared case-insensitively.
    pub fn header<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        self.header_values(name).next()
    }

    /// Every value of the named header, in arrival order.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A response as produced by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineResponse {
    pub head: ResponseHead,
    pub body: Body,
}

impl EngineResponse {
    pub fn new(status: u16, body: impl Into<Body>) -> Self {
        Self {
            head: ResponseHead::new(status),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.head.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn from_cache(mut self, processed: bool) -> Self {
        self.head.from_cache = true;
        self.head.processed = processed;
        self
    }

    pub fn with_request_uri(mut self, uri: Url) -> Self {
        self.head.request_uri = Some(uri);
        self
    }
}

/// Which path produced the body of a `Processed` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// The engine's body, untouched.
    Raw,
    /// A value parsed on an earlier pass, restored from the cache.
    CacheRestored,
    /// A value produced by the body parser on this pass.
    FreshlyParsed,
}

/// The outcome delivered to a caller for a successful request.
#[derive(Debug, Clone, PartialEq)]
pub struct Processed {
    pub head: ResponseHead,
    pub body: Body,
    pub provenance: Provenance,
}
