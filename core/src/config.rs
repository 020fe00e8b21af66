//! Client configuration.
//!
//! # Design
//! Configuration arrives as a JSON mapping with three recognized sections.
//! Each section is merged over its defaults, so supplying one knob never
//! discards the others:
//!
//! - `redis`: connection info forwarded to an engine built by the client;
//! - `requestor` (alias `requestorOptions`): throttle, cache and lock-time
//!   knobs forwarded to that engine;
//! - `defaultRequestOptions`: the base every request's options are
//!   resolved against.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ClientError;
use crate::types::RequestOptions;

const DEFAULT_REDIS_HOST: &str = "localhost";
const DEFAULT_REDIS_PORT: u16 = 6379;
const DEFAULT_MAX_LOCK_TIME_MS: u64 = 5000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_REDIS_HOST.to_string(),
            port: DEFAULT_REDIS_PORT,
        }
    }
}

/// Knobs for the engine's throttle and cache layers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestorSettings {
    pub throttle: Value,
    pub cache: Value,
    pub disable_cache: bool,
    /// Milliseconds.
    pub max_lock_time: u64,
    /// Engine-specific keys, forwarded as given.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RequestorSettings {
    pub fn max_lock_time(&self) -> Duration {
        Duration::from_millis(self.max_lock_time)
    }
}

impl Default for RequestorSettings {
    fn default() -> Self {
        Self {
            throttle: Value::Object(Map::new()),
            cache: Value::Object(Map::new()),
            disable_cache: false,
            max_lock_time: DEFAULT_MAX_LOCK_TIME_MS,
            extra: Map::new(),
        }
    }
}

/// What an engine factory receives when the client builds its own engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub requestor: RequestorSettings,
    pub redis: RedisConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub redis: RedisConfig,
    pub requestor: RequestorSettings,
    pub default_request_options: RequestOptions,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    #[serde(default)]
    redis: RedisConfig,
    #[serde(default, alias = "requestorOptions")]
    requestor: RequestorSettings,
    #[serde(default)]
    default_request_options: RequestOptions,
}

impl ClientConfig {
    /// Parse a configuration mapping. Anything other than a JSON object is
    /// rejected.
    pub fn from_value(value: &Value) -> Result<Self, ClientError> {
        if !value.is_object() {
            return Err(ClientError::Config(
                "options need to be defined for RequestorClient".to_string(),
            ));
        }
        let raw = RawConfig::deserialize(value).map_err(|e| ClientError::Config(e.to_string()))?;

        let mut default_request_options = base_request_options();
        default_request_options.merge_from(raw.default_request_options);

        Ok(Self {
            redis: raw.redis,
            requestor: raw.requestor,
            default_request_options,
        })
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            requestor: self.requestor.clone(),
            redis: self.redis.clone(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            redis: RedisConfig::default(),
            requestor: RequestorSettings::default(),
            default_request_options: base_request_options(),
        }
    }
}

fn base_request_options() -> RequestOptions {
    RequestOptions::default().force_jar(false)
}
