//! Request-options normalizer and response adapter for a caching,
//! throttling HTTP engine.
//!
//! # Overview
//! The engine that performs transport, caching and throttling is supplied
//! by the caller behind the `Engine` trait. This crate resolves loosely
//! specified request options into canonical ones, delivers every engine
//! answer through one uniform outcome, feeds freshly parsed bodies back
//! into the engine's cache, and drives cookie jars whose stores cannot be
//! accessed synchronously.
//!
//! # Design
//! - `resolver::resolve` is pure: defaults + caller options -> canonical
//!   options, with `Authorization` header > `auth` > `accessToken`
//!   precedence and jar suppression for authenticated requests.
//! - `pipeline::process_reply` maps one engine answer to an immutable
//!   `Processed` value that states where its body came from.
//! - `bridge` sequences cookie read -> engine call -> cookie writes for
//!   asynchronous jars.
//! - Failures of fire-and-forget side effects are logged with `tracing`
//!   and published on a `Diagnostic` broadcast channel.

pub mod client;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod http;
pub mod jar;
pub mod pipeline;
pub mod resolver;
pub mod types;

mod bridge;
#[cfg(test)]
mod testing;

pub use client::{EngineFactory, RequestorClient};
pub use config::{ClientConfig, EngineSettings, RedisConfig, RequestorSettings};
pub use diagnostics::Diagnostic;
pub use engine::{CachePassback, CacheWrite, Engine, EngineReply, EngineRequest, PayloadKind};
pub use error::{CacheError, ClientError, EngineError, JarError};
pub use http::{Body, EngineResponse, Method, Processed, Provenance, ResponseHead};
pub use jar::{CookieJar, CookieStore, MemoryCookieStore};
pub use pipeline::BodyParser;
pub use types::{Auth, CallerOptions, RequestOptions};
