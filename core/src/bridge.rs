//! Client-side cookie handling for jars backed by asynchronous stores.
//!
//! # Design
//! The engine reads and writes jars synchronously. When the jar's store
//! cannot answer without I/O, the client does the jar work itself, in
//! strict sequence:
//!
//! 1. read the cookie string for the target URI (a failure ends the
//!    request before the engine is contacted);
//! 2. strip the jar from the options and merge the cookies into the
//!    `Cookie` header, retrieved cookies first;
//! 3. run the engine;
//! 4. store every `Set-Cookie` value against the resolved request URI.
//!
//! Cookie writes are attempted independently and concurrently; failures
//! are logged and published as one diagnostic, and never replace the
//! response.

use std::collections::BTreeMap;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::engine::{Engine, EngineReply, EngineRequest};
use crate::error::ClientError;
use crate::http::ResponseHead;
use crate::jar::CookieJar;

/// Run `request` through `engine`, driving `jar` around the call.
pub(crate) async fn execute_with_jar(
    engine: &dyn Engine,
    mut request: EngineRequest,
    jar: CookieJar,
    diagnostics: &Diagnostics,
) -> Result<EngineReply, ClientError> {
    let cookies = jar
        .cookie_string(&request.uri)
        .await
        .map_err(ClientError::CookieRead)?;
    debug!(found = !cookies.is_empty(), "read cookies from jar");

    request.options.jar = None;
    inject_cookies(&mut request.options.headers, &cookies);

    let reply = engine.execute(request).await?;
    store_cookies(&jar, &reply.response.head, diagnostics).await;
    Ok(reply)
}

fn inject_cookies(headers: &mut BTreeMap<String, String>, cookies: &str) {
    let existing_key = headers
        .keys()
        .find(|key| key.eq_ignore_ascii_case("cookie"))
        .cloned();
    let existing = existing_key
        .and_then(|key| headers.remove(&key))
        .unwrap_or_default();

    let merged = match (cookies.is_empty(), existing.is_empty()) {
        (false, false) => format!("{cookies}; {existing}"),
        (false, true) => cookies.to_string(),
        (true, _) => existing,
    };
    if !merged.is_empty() {
        headers.insert("Cookie".to_string(), merged);
    }
}

async fn store_cookies(jar: &CookieJar, head: &ResponseHead, diagnostics: &Diagnostics) {
    let Some(uri) = head.request_uri.as_ref() else {
        return;
    };
    let values: Vec<&str> = head.header_values("set-cookie").collect();
    if values.is_empty() {
        return;
    }

    let results = join_all(values.iter().map(|value| jar.set_cookie(value, uri))).await;
    let failures: Vec<String> = results
        .into_iter()
        .filter_map(Result::err)
        .map(|err| err.to_string())
        .collect();

    if failures.is_empty() {
        debug!(count = values.len(), "stored response cookies");
    } else {
        warn!(
            %uri,
            failed = failures.len(),
            total = values.len(),
            "failed to store response cookies"
        );
        diagnostics.publish(Diagnostic::CookieWriteFailed {
            uri: uri.clone(),
            failures,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::http::{EngineResponse, Method};
    use crate::testing::{RecordingJar, ScriptedEngine};
    use crate::types::RequestOptions;
    use url::Url;

    fn target() -> Url {
        Url::parse("http://api.example.com/profile").unwrap()
    }

    fn request(jar: CookieJar) -> EngineRequest {
        EngineRequest::new(Method::Get, target(), RequestOptions::default().with_jar(jar))
    }

    async fn run(
        engine: &ScriptedEngine,
        jar: &RecordingJar,
        diagnostics: &Diagnostics,
    ) -> Result<EngineReply, ClientError> {
        execute_with_jar(engine, request(jar.handle()), jar.handle(), diagnostics).await
    }

    #[test]
    fn cookies_are_prepended_to_existing_header() {
        let mut headers = BTreeMap::from([("cookie".to_string(), "theme=dark".to_string())]);
        inject_cookies(&mut headers, "session=abc");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers["Cookie"], "session=abc; theme=dark");
    }

    #[test]
    fn empty_sides_do_not_add_separators() {
        let mut headers = BTreeMap::new();
        inject_cookies(&mut headers, "session=abc");
        assert_eq!(headers["Cookie"], "session=abc");

        let mut headers = BTreeMap::from([("Cookie".to_string(), "theme=dark".to_string())]);
        inject_cookies(&mut headers, "");
        assert_eq!(headers["Cookie"], "theme=dark");

        let mut headers = BTreeMap::new();
        inject_cookies(&mut headers, "");
        assert!(headers.is_empty());
    }

    #[tokio::test]
    async fn read_failure_never_reaches_engine() {
        let engine = ScriptedEngine::ok(|_| EngineResponse::new(200, "unused"));
        let jar = RecordingJar::failing_read("store offline");
        let err = run(&engine, &jar, &Diagnostics::new()).await.unwrap_err();

        assert!(matches!(err, ClientError::CookieRead(_)));
        assert_eq!(engine.calls(), 0);
    }

    #[tokio::test]
    async fn engine_sees_cookie_header_and_no_jar() {
        let jar = RecordingJar::with_cookies("session=abc");
        let reads = jar.clone();
        let engine = ScriptedEngine::ok(move |_| {
            assert_eq!(reads.reads(), 1, "cookies are read before dispatch");
            EngineResponse::new(200, "ok")
        });

        let req = EngineRequest::new(
            Method::Get,
            target(),
            RequestOptions::default()
                .with_header("Cookie", "theme=dark")
                .with_jar(jar.handle()),
        );
        execute_with_jar(engine.as_ref(), req, jar.handle(), &Diagnostics::new())
            .await
            .unwrap();

        let sent = engine.requests();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].options.jar.is_none());
        assert_eq!(sent[0].options.header("cookie"), Some("session=abc; theme=dark"));
    }

    #[tokio::test]
    async fn set_cookie_values_are_written_one_by_one() {
        let jar = RecordingJar::with_cookies("");
        let resolved = Url::parse("http://api.example.com/landing").unwrap();
        let landing = resolved.clone();
        let engine = ScriptedEngine::ok(move |_| {
            EngineResponse::new(200, "ok")
                .with_header("Set-Cookie", "a=1")
                .with_header("Set-Cookie", "b=2")
                .with_request_uri(landing.clone())
        });

        run(&engine, &jar, &Diagnostics::new()).await.unwrap();

        let writes = jar.writes();
        assert_eq!(writes.len(), 2);
        assert!(writes.contains(&("a=1".to_string(), resolved.clone())));
        assert!(writes.contains(&("b=2".to_string(), resolved)));
    }

    #[tokio::test]
    async fn cookies_without_resolved_uri_are_not_written() {
        let jar = RecordingJar::with_cookies("");
        let engine =
            ScriptedEngine::ok(|_| EngineResponse::new(200, "ok").with_header("Set-Cookie", "a=1"));
        run(&engine, &jar, &Diagnostics::new()).await.unwrap();
        assert!(jar.writes().is_empty());
    }

    #[tokio::test]
    async fn write_failures_are_aggregated_and_response_survives() {
        let jar = RecordingJar::with_cookies("").rejecting("a=1");
        let diagnostics = Diagnostics::new();
        let mut events = diagnostics.subscribe();
        let engine = ScriptedEngine::ok(|_| {
            EngineResponse::new(200, "ok")
                .with_header("set-cookie", "a=1")
                .with_header("set-cookie", "b=2")
                .with_request_uri(target())
        });

        let reply = run(&engine, &jar, &diagnostics).await.unwrap();
        assert_eq!(reply.response.head.status, 200);
        assert_eq!(jar.writes().len(), 2, "every write is attempted");

        match events.recv().await.unwrap() {
            Diagnostic::CookieWriteFailed { uri, failures } => {
                assert_eq!(uri, target());
                assert_eq!(failures.len(), 1);
            }
            other => panic!("unexpected diagnostic: {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_error_skips_cookie_writes() {
        let jar = RecordingJar::with_cookies("session=abc");
        let engine = ScriptedEngine::new(|_| Err(EngineError::new("ECONNRESET")));
        let err = run(&engine, &jar, &Diagnostics::new()).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert!(jar.writes().is_empty());
    }
}
