//! Request option DTOs.
//!
//! # Design
//! The fields of `RequestOptions` are the complete set of recognized
//! option keys. Deserializing a caller's bag through these types is what
//! drops unrecognized keys, so no separate allow-list is kept. The cookie
//! jar is a live handle rather than data and never goes through serde.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::jar::CookieJar;

/// Credentials for basic or bearer authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auth {
    #[serde(default, alias = "username", skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, alias = "password", skip_serializing_if = "Option::is_none")]
    pub pass: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_immediately: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer: Option<String>,
    /// Credential keys this crate does not interpret; the engine may.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Auth {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            bearer: Some(token.into()),
            ..Self::default()
        }
    }

    pub fn basic(user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            pass: Some(pass.into()),
            ..Self::default()
        }
    }

    /// True when no credential key at all is set.
    pub fn is_empty(&self) -> bool {
        self.user.is_none()
            && self.pass.is_none()
            && self.send_immediately.is_none()
            && self.bearer.is_none()
            && self.extra.is_empty()
    }

    fn merge_from(&mut self, overlay: Auth) {
        overlay_field(&mut self.user, overlay.user);
        overlay_field(&mut self.pass, overlay.pass);
        overlay_field(&mut self.send_immediately, overlay.send_immediately);
        overlay_field(&mut self.bearer, overlay.bearer);
        self.extra.extend(overlay.extra);
    }
}

/// Canonical options handed to the engine.
///
/// Transport knobs (`headers` through `forceJar`) and cache knobs (`ttl`
/// onward) are passed through to the engine untouched; only `headers`,
/// `auth` and `jar` are ever rewritten by this crate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<Auth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<Value>,
    /// Milliseconds, forwarded to the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    #[serde(default, rename = "strictSSL", skip_serializing_if = "Option::is_none")]
    pub strict_ssl: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_options: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tunnel: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_header_white_list: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_header_exclusive_list: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_jar: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_cache: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_private: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_no_store: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_no_last_mod: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_validators: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_validators: Option<Vec<Value>>,
    #[serde(skip)]
    pub jar: Option<CookieJar>,
}

impl RequestOptions {
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_jar(mut self, jar: CookieJar) -> Self {
        self.jar = Some(jar);
        self
    }

    pub fn force_jar(mut self, force: bool) -> Self {
        self.force_jar = Some(force);
        self
    }

    /// Value of the named header, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Overlay `overlay` onto `self`.
    ///
    /// Headers combine key-wise with names compared case-insensitively, the
    /// overlay's spelling replacing the base's. `auth` combines field-wise and the
    /// free-form `pool` / `agentOptions` objects merge recursively. Every
    /// other field set on `overlay` replaces the current value.
    pub fn merge_from(&mut self, overlay: RequestOptions) {
        for (name, value) in overlay.headers {
            self.headers.retain(|key, _| !key.eq_ignore_ascii_case(&name));
            self.headers.insert(name, value);
        }
        match (&mut self.auth, overlay.auth) {
            (Some(base), Some(auth)) => base.merge_from(auth),
            (slot, auth) => overlay_field(slot, auth),
        }
        merge_value_field(&mut self.pool, overlay.pool);
        merge_value_field(&mut self.agent_options, overlay.agent_options);
        overlay_field(&mut self.timeout, overlay.timeout);
        overlay_field(&mut self.proxy, overlay.proxy);
        overlay_field(&mut self.strict_ssl, overlay.strict_ssl);
        overlay_field(&mut self.tunnel, overlay.tunnel);
        overlay_field(&mut self.proxy_header_white_list, overlay.proxy_header_white_list);
        overlay_field(
            &mut self.proxy_header_exclusive_list,
            overlay.proxy_header_exclusive_list,
        );
        overlay_field(&mut self.force_jar, overlay.force_jar);
        overlay_field(&mut self.ttl, overlay.ttl);
        overlay_field(&mut self.disable_cache, overlay.disable_cache);
        overlay_field(&mut self.store_private, overlay.store_private);
        overlay_field(&mut self.store_no_store, overlay.store_no_store);
        overlay_field(&mut self.ignore_no_last_mod, overlay.ignore_no_last_mod);
        overlay_field(&mut self.request_validators, overlay.request_validators);
        overlay_field(&mut self.response_validators, overlay.response_validators);
        overlay_field(&mut self.jar, overlay.jar);
    }
}

/// Loosely specified options as supplied by a caller.
///
/// Besides the recognized request options it may carry an `accessToken`
/// shorthand, which the resolver turns into bearer authentication. A
/// non-string `accessToken` is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerOptions {
    #[serde(flatten)]
    pub request: RequestOptions,
    #[serde(default, deserialize_with = "string_only")]
    pub access_token: Option<String>,
}

impl CallerOptions {
    pub fn new(request: RequestOptions) -> Self {
        Self {
            request,
            access_token: None,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

impl From<RequestOptions> for CallerOptions {
    fn from(request: RequestOptions) -> Self {
        Self::new(request)
    }
}

fn string_only<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(token) => Some(token),
        _ => None,
    })
}

fn overlay_field<T>(slot: &mut Option<T>, overlay: Option<T>) {
    if overlay.is_some() {
        *slot = overlay;
    }
}

fn merge_value_field(slot: &mut Option<Value>, overlay: Option<Value>) {
    match (slot.as_mut(), overlay) {
        (Some(base), Some(value)) => merge_value(base, value),
        (None, Some(value)) => *slot = Some(value),
        (_, None) => {}
    }
}

/// Recursive object merge; non-object values replace.
fn merge_value(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
