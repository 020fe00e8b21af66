//! Contract of the underlying request engine.
//!
//! # Design
//! The engine (transport, cache, throttling, pooling) is a black box. It
//! receives the canonical options for one request and answers with either
//! a transport error or a response, optionally accompanied by a one-shot
//! `CachePassback` that stores a re-serialized body under the request's
//! cache key.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use url::Url;

use crate::error::{CacheError, EngineError};
use crate::http::{EngineResponse, Method};
use crate::types::RequestOptions;

/// One request as handed to the engine.
#[derive(Debug, Clone)]
pub struct EngineRequest {
    pub method: Method,
    pub uri: Url,
    pub options: RequestOptions,
    pub body: Option<String>,
}

impl EngineRequest {
    pub fn new(method: Method, uri: Url, options: RequestOptions) -> Self {
        Self {
            method,
            uri,
            options,
            body: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

#[async_trait]
pub trait Engine: Send + Sync {
    async fn execute(&self, request: EngineRequest) -> Result<EngineReply, EngineError>;
}

/// Successful engine answer.
#[derive(Debug)]
pub struct EngineReply {
    pub response: EngineResponse,
    pub passback: Option<CachePassback>,
}

impl EngineReply {
    pub fn new(response: EngineResponse) -> Self {
        Self {
            response,
            passback: None,
        }
    }

    pub fn with_passback(mut self, passback: CachePassback) -> Self {
        self.passback = Some(passback);
        self
    }
}

/// Type tag stored next to a passed-back payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PayloadKind {
    /// The payload is a JSON document stored as a string.
    String,
}

impl PayloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadKind::String => "string",
        }
    }
}

/// Payload written back into the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheWrite {
    pub payload: String,
    pub kind: PayloadKind,
}

/// One-shot continuation that persists a parsed body into the engine's
/// cache. Consumed by `pass_back`, so it runs at most once.
pub struct CachePassback {
    store: Box<dyn FnOnce(CacheWrite) -> BoxFuture<'static, Result<(), CacheError>> + Send>,
}

impl CachePassback {
    pub fn new<F, Fut>(store: F) -> Self
    where
        F: FnOnce(CacheWrite) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), CacheError>> + Send + 'static,
    {
        Self {
            store: Box::new(move |write| store(write).boxed()),
        }
    }

    pub fn pass_back(self, write: CacheWrite) -> BoxFuture<'static, Result<(), CacheError>> {
        (self.store)(write)
    }
}

impl fmt::Debug for CachePassback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CachePassback")
    }
}
