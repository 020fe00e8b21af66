//! Options resolution: defaults + caller options -> canonical options.
//!
//! # Design
//! Resolution is a pure function. Authentication precedence is decided
//! here, first match wins:
//!
//! 1. an `Authorization` header (any case),
//! 2. a non-empty `auth` object,
//! 3. an `accessToken` shorthand, turned into `auth = { bearer }`.
//!
//! Once any of them applies, the cookie jar is dropped unless the caller
//! asked for it with `forceJar: true`.

use tracing::trace;

use crate::types::{Auth, CallerOptions, RequestOptions};

/// Which mechanism supplied the request's credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    Header,
    AuthObject,
    AccessToken,
}

/// Merge `caller` over `defaults` and apply authentication precedence.
pub fn resolve(defaults: &RequestOptions, caller: &CallerOptions) -> RequestOptions {
    let mut options = defaults.clone();
    options.merge_from(caller.request.clone());

    let source = authenticate(&mut options, caller.access_token.as_deref());

    if let Some(source) = source {
        if caller.request.force_jar != Some(true) && options.jar.take().is_some() {
            trace!(?source, "dropping cookie jar for authenticated request");
        }
    }
    options
}

/// Decide the active credentials, synthesizing bearer auth from an access
/// token when nothing stronger is present.
fn authenticate(options: &mut RequestOptions, access_token: Option<&str>) -> Option<AuthSource> {
    if options.header("authorization").is_some() {
        return Some(AuthSource::Header);
    }
    if options.auth.as_ref().is_some_and(|auth| !auth.is_empty()) {
        return Some(AuthSource::AuthObject);
    }
    let token = access_token?;
    options.auth = Some(Auth::bearer(token));
    Some(AuthSource::AccessToken)
}
