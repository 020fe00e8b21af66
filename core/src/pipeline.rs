//! Response pipeline: one engine answer in, one uniform outcome out.
//!
//! # Design
//! Every engine answer lands in exactly one of five outcomes:
//!
//! - transport error: forwarded untouched;
//! - status outside 200..=299: a `Status` error carrying the body as text;
//! - cache hit already processed: the stored JSON is restored, the parser
//!   and the passback are not touched;
//! - no parser: the raw body is delivered;
//! - parser present: the body is parsed, the JSON form is handed to the
//!   cache passback on a detached task, and the head is marked processed.
//!
//! A panicking parser unwinds through `process_reply`; parser bugs are not
//! turned into request errors.

use serde_json::Value;
use tracing::{debug, warn, Instrument};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::engine::{CachePassback, CacheWrite, EngineReply, PayloadKind};
use crate::error::ClientError;
use crate::http::{Body, EngineResponse, Processed, Provenance};

/// Turns a raw body into the value delivered to the caller.
pub type BodyParser = dyn Fn(Body) -> Value + Send + Sync;

/// Map one engine answer to the caller's outcome.
///
/// Must run inside a tokio runtime when a passback can fire.
pub fn process_reply(
    reply: Result<EngineReply, ClientError>,
    parser: Option<&BodyParser>,
    diagnostics: &Diagnostics,
) -> Result<Processed, ClientError> {
    let EngineReply { response, passback } = reply?;
    let EngineResponse { mut head, body } = response;

    if !head.is_success() {
        debug!(status = head.status, "engine returned failure status");
        return Err(ClientError::Status {
            status: head.status,
            message: body.to_message(),
        });
    }

    if head.from_cache && head.processed {
        debug!("restoring processed body from cache");
        let body = match body {
            Body::Text(stored) => Body::Json(serde_json::from_str(&stored)?),
            restored @ Body::Json(_) => restored,
        };
        return Ok(Processed {
            head,
            body,
            provenance: Provenance::CacheRestored,
        });
    }

    let Some(parser) = parser else {
        return Ok(Processed {
            head,
            body,
            provenance: Provenance::Raw,
        });
    };

    let parsed = parser(body);
    if let Some(passback) = passback {
        spawn_passback(
            passback,
            CacheWrite {
                payload: parsed.to_string(),
                kind: PayloadKind::String,
            },
            diagnostics.clone(),
        );
    }
    head.processed = true;
    debug!("body parsed");

    Ok(Processed {
        head,
        body: Body::Json(parsed),
        provenance: Provenance::FreshlyParsed,
    })
}

fn spawn_passback(passback: CachePassback, write: CacheWrite, diagnostics: Diagnostics) {
    tokio::spawn(
        async move {
            if let Err(err) = passback.pass_back(write).await {
                warn!(error = %err, "cache passback failed");
                diagnostics.publish(Diagnostic::CachePassbackFailed {
                    error: err.to_string(),
                });
            }
        }
        .in_current_span(),
    );
}
