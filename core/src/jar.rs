//! Cookie jar capability.
//!
//! # Design
//! A jar is a shared handle to a `CookieStore`. The engine only knows how to
//! use stores that answer synchronously; stores that report
//! `is_synchronous() == false` are driven by the client itself around the
//! engine call (see `bridge`). This crate never owns cookie state beyond
//! the in-memory store provided for simple setups and tests.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use url::Url;

use crate::error::JarError;

/// Backend of a cookie jar.
#[async_trait]
pub trait CookieStore: Send + Sync {
    /// Whether the store can be read and written without I/O.
    fn is_synchronous(&self) -> bool;

    /// `Cookie` header value for requests to `uri`.
    async fn cookie_string(&self, uri: &Url) -> Result<String, JarError>;

    /// Store one `Set-Cookie` header value received from `uri`.
    async fn set_cookie(&self, cookie: &str, uri: &Url) -> Result<(), JarError>;
}

/// Cloneable handle to a cookie store, carried in request options.
#[derive(Clone)]
pub struct CookieJar {
    store: Arc<dyn CookieStore>,
}

impl CookieJar {
    pub fn new(store: impl CookieStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn from_store(store: Arc<dyn CookieStore>) -> Self {
        Self { store }
    }

    pub fn is_synchronous(&self) -> bool {
        self.store.is_synchronous()
    }

    pub async fn cookie_string(&self, uri: &Url) -> Result<String, JarError> {
        self.store.cookie_string(uri).await
    }

    pub async fn set_cookie(&self, cookie: &str, uri: &Url) -> Result<(), JarError> {
        self.store.set_cookie(cookie, uri).await
    }
}

impl fmt::Debug for CookieJar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieJar")
            .field("synchronous", &self.store.is_synchronous())
            .finish()
    }
}

/// Two handles are equal when they share the same store.
impl PartialEq for CookieJar {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.store) as *const (),
            Arc::as_ptr(&other.store) as *const (),
        )
    }
}

/// In-process cookie store keyed by host.
///
/// Only the `name=value` pair of each `Set-Cookie` value is kept; a later
/// cookie with the same name replaces the earlier one. Built with
/// `deferred()` it reports itself as asynchronous, which routes requests
/// through the client-side jar bridge.
#[derive(Debug)]
pub struct MemoryCookieStore {
    synchronous: bool,
    cookies: Mutex<HashMap<String, Vec<(String, String)>>>,
}

impl MemoryCookieStore {
    pub fn new() -> Self {
        Self {
            synchronous: true,
            cookies: Mutex::default(),
        }
    }

    pub fn deferred() -> Self {
        Self {
            synchronous: false,
            cookies: Mutex::default(),
        }
    }
}

impl Default for MemoryCookieStore {
    fn default() -> Self {
        Self::new()
    }
}

fn host_key(uri: &Url) -> Result<String, JarError> {
    uri.host_str()
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| JarError(format!("no host in {uri}")))
}

#[async_trait]
impl CookieStore for MemoryCookieStore {
    fn is_synchronous(&self) -> bool {
        self.synchronous
    }

    async fn cookie_string(&self, uri: &Url) -> Result<String, JarError> {
        let host = host_key(uri)?;
        let cookies = self.cookies.lock();
        Ok(cookies
            .get(&host)
            .map(|pairs| {
                pairs
                    .iter()
                    .map(|(name, value)| format!("{name}={value}"))
                    .collect::<Vec<_>>()
                    .join("; ")
            })
            .unwrap_or_default())
    }

    async fn set_cookie(&self, cookie: &str, uri: &Url) -> Result<(), JarError> {
        let host = host_key(uri)?;
        let pair = cookie.split(';').next().unwrap_or_default();
        let (name, value) = pair
            .split_once('=')
            .map(|(name, value)| (name.trim(), value.trim()))
            .filter(|(name, _)| !name.is_empty())
            .ok_or_else(|| JarError(format!("malformed cookie: {cookie}")))?;

        let mut cookies = self.cookies.lock();
        let entry = cookies.entry(host).or_default();
        match entry.iter_mut().find(|(existing, _)| existing == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => entry.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }
}
