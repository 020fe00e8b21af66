//! Fakes shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use url::Url;

use crate::engine::{Engine, EngineReply, EngineRequest};
use crate::error::{EngineError, JarError};
use crate::http::EngineResponse;
use crate::jar::{CookieJar, CookieStore};

type Responder = dyn Fn(&EngineRequest) -> Result<EngineResponse, EngineError> + Send + Sync;

/// Engine that answers from a closure and records every request.
pub(crate) struct ScriptedEngine {
    respond: Box<Responder>,
    requests: Mutex<Vec<EngineRequest>>,
}

impl ScriptedEngine {
    pub(crate) fn new<F>(respond: F) -> Arc<Self>
    where
        F: Fn(&EngineRequest) -> Result<EngineResponse, EngineError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            respond: Box::new(respond),
            requests: Mutex::default(),
        })
    }

    pub(crate) fn ok<F>(respond: F) -> Arc<Self>
    where
        F: Fn(&EngineRequest) -> EngineResponse + Send + Sync + 'static,
    {
        Self::new(move |request| Ok(respond(request)))
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub(crate) fn requests(&self) -> Vec<EngineRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Engine for ScriptedEngine {
    async fn execute(&self, request: EngineRequest) -> Result<EngineReply, EngineError> {
        let outcome = (self.respond)(&request);
        self.requests.lock().push(request);
        outcome.map(EngineReply::new)
    }
}

/// Asynchronous cookie store that serves a fixed cookie string and
/// records writes.
#[derive(Clone)]
pub(crate) struct RecordingJar {
    inner: Arc<RecordingJarInner>,
}

struct RecordingJarInner {
    cookies: Result<String, String>,
    rejected: Vec<String>,
    reads: AtomicUsize,
    writes: Mutex<Vec<(String, Url)>>,
}

impl RecordingJar {
    pub(crate) fn with_cookies(cookies: &str) -> Self {
        Self::build(Ok(cookies.to_string()), Vec::new())
    }

    pub(crate) fn failing_read(error: &str) -> Self {
        Self::build(Err(error.to_string()), Vec::new())
    }

    /// Make writes of exactly `cookie` fail.
    pub(crate) fn rejecting(self, cookie: &str) -> Self {
        let mut rejected = self.inner.rejected.clone();
        rejected.push(cookie.to_string());
        Self::build(self.inner.cookies.clone(), rejected)
    }

    fn build(cookies: Result<String, String>, rejected: Vec<String>) -> Self {
        Self {
            inner: Arc::new(RecordingJarInner {
                cookies,
                rejected,
                reads: AtomicUsize::new(0),
                writes: Mutex::default(),
            }),
        }
    }

    pub(crate) fn handle(&self) -> CookieJar {
        CookieJar::new(self.clone())
    }

    pub(crate) fn reads(&self) -> usize {
        self.inner.reads.load(Ordering::SeqCst)
    }

    pub(crate) fn writes(&self) -> Vec<(String, Url)> {
        self.inner.writes.lock().clone()
    }
}

#[async_trait]
impl CookieStore for RecordingJar {
    fn is_synchronous(&self) -> bool {
        false
    }

    async fn cookie_string(&self, _uri: &Url) -> Result<String, JarError> {
        self.inner.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.cookies.clone().map_err(JarError)
    }

    async fn set_cookie(&self, cookie: &str, uri: &Url) -> Result<(), JarError> {
        self.inner
            .writes
            .lock()
            .push((cookie.to_string(), uri.clone()));
        if self.inner.rejected.iter().any(|rejected| rejected == cookie) {
            return Err(JarError(format!("refused {cookie}")));
        }
        Ok(())
    }
}
