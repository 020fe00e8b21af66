//! Request client: options resolution and dispatch through the engine.
//!
//! # Design
//! `RequestorClient` holds the engine, the resolved configuration and the
//! diagnostics channel, and carries no per-request state. A dispatch is a
//! straight sequence: optional jar bridge, engine call, response pipeline.
//! Jars whose store answers synchronously travel to the engine untouched;
//! asynchronous ones are handled by `bridge` around the engine call.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info_span, Instrument};
use url::Url;
use uuid::Uuid;

use crate::bridge;
use crate::config::{ClientConfig, EngineSettings};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::engine::{Engine, EngineRequest};
use crate::error::ClientError;
use crate::http::{Method, Processed};
use crate::pipeline::{self, BodyParser};
use crate::resolver;
use crate::types::{CallerOptions, RequestOptions};

/// Builds an engine when the client is not handed one.
pub trait EngineFactory {
    fn build(&self, settings: &EngineSettings) -> Result<Arc<dyn Engine>, ClientError>;
}

impl<F> EngineFactory for F
where
    F: Fn(&EngineSettings) -> Result<Arc<dyn Engine>, ClientError>,
{
    fn build(&self, settings: &EngineSettings) -> Result<Arc<dyn Engine>, ClientError> {
        self(settings)
    }
}

/// Normalizes request options and adapts engine answers for callers.
#[derive(Clone)]
pub struct RequestorClient {
    engine: Arc<dyn Engine>,
    config: ClientConfig,
    diagnostics: Diagnostics,
}

impl RequestorClient {
    /// Create a client around an existing engine.
    pub fn new(config: &Value, engine: Arc<dyn Engine>) -> Result<Self, ClientError> {
        let config = ClientConfig::from_value(config)?;
        Ok(Self::from_parts(config, engine))
    }

    /// Create a client whose engine is built from the `requestor` and
    /// `redis` sections of `config`.
    pub fn with_factory(config: &Value, factory: &dyn EngineFactory) -> Result<Self, ClientError> {
        let config = ClientConfig::from_value(config)?;
        let engine = factory.build(&config.engine_settings())?;
        Ok(Self::from_parts(config, engine))
    }

    pub fn from_parts(config: ClientConfig, engine: Arc<dyn Engine>) -> Self {
        Self {
            engine,
            config,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn default_request_options(&self) -> &RequestOptions {
        &self.config.default_request_options
    }

    /// Receive diagnostics for failed cache passbacks and cookie writes.
    pub fn subscribe(&self) -> broadcast::Receiver<Diagnostic> {
        self.diagnostics.subscribe()
    }

    /// Canonical options for `caller`, resolved against the client defaults.
    pub fn request_options(&self, caller: &CallerOptions) -> RequestOptions {
        resolver::resolve(&self.config.default_request_options, caller)
    }

    /// Like `request_options`, for a loosely typed JSON bag.
    ///
    /// Unknown keys are dropped, but a recognized key holding the wrong JSON
    /// type (`"timeout": "5000"`, `"forceJar": 1`, a numeric header value)
    /// is rejected with `ClientError::Config` rather than coerced.
    pub fn request_options_from_value(
        &self,
        caller: &Value,
    ) -> Result<RequestOptions, ClientError> {
        if !caller.is_object() {
            return Err(ClientError::Config(
                "request options must be a mapping".to_string(),
            ));
        }
        let caller =
            CallerOptions::deserialize(caller).map_err(|e| ClientError::Config(e.to_string()))?;
        Ok(self.request_options(&caller))
    }

    /// Dispatch without a body parser; successful bodies arrive raw.
    pub async fn send(
        &self,
        method: Method,
        uri: Url,
        options: RequestOptions,
    ) -> Result<Processed, ClientError> {
        self.execute(EngineRequest::new(method, uri, options), None)
            .await
    }

    /// Dispatch and run `parser` over fresh successful bodies.
    pub async fn send_parsed(
        &self,
        method: Method,
        uri: Url,
        options: RequestOptions,
        parser: &BodyParser,
    ) -> Result<Processed, ClientError> {
        self.execute(EngineRequest::new(method, uri, options), Some(parser))
            .await
    }

    /// Dispatch with the method given by name, e.g. `"get"` or `"POST"`.
    pub async fn dispatch(
        &self,
        method: &str,
        uri: Url,
        options: RequestOptions,
        parser: Option<&BodyParser>,
    ) -> Result<Processed, ClientError> {
        let method = method.parse()?;
        self.execute(EngineRequest::new(method, uri, options), parser)
            .await
    }

    /// Run one fully described request.
    pub async fn execute(
        &self,
        request: EngineRequest,
        parser: Option<&BodyParser>,
    ) -> Result<Processed, ClientError> {
        let span = info_span!(
            "request",
            method = %request.method,
            uri = %request.uri,
            request_id = %Uuid::new_v4(),
        );

        async move {
            let reply = match request.options.jar.clone() {
                Some(jar) if !jar.is_synchronous() => {
                    bridge::execute_with_jar(self.engine.as_ref(), request, jar, &self.diagnostics)
                        .await
                }
                _ => self.engine.execute(request).await.map_err(ClientError::from),
            };

            let outcome = pipeline::process_reply(reply, parser, &self.diagnostics);
            match &outcome {
                Ok(processed) => debug!(
                    status = processed.head.status,
                    provenance = ?processed.provenance,
                    "request complete"
                ),
                Err(err) => debug!(error = %err, "request failed"),
            }
            outcome
        }
        .instrument(span)
        .await
    }
}

impl fmt::Debug for RequestorClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestorClient")
            .field("config", &self.config)
            .finish()
    }
}
