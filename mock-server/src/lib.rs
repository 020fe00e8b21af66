use std::{collections::HashSet, sync::Arc};

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Bearer token accepted by `/profile` in place of a session cookie.
pub const SERVICE_TOKEN: &str = "service-token";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub session: Uuid,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub user: String,
    pub via: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub cookie: Option<String>,
    pub authorization: Option<String>,
}

pub type Sessions = Arc<RwLock<HashSet<Uuid>>>;

pub fn app() -> Router {
    let sessions: Sessions = Arc::new(RwLock::new(HashSet::new()));
    Router::new()
        .route("/login", get(login))
        .route("/profile", get(profile))
        .route("/echo", get(echo))
        .route("/greeting", get(greeting))
        .route("/broken", get(broken))
        .with_state(sessions)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn login(State(sessions): State<Sessions>) -> impl IntoResponse {
    let session = Uuid::new_v4();
    sessions.write().await.insert(session);
    (
        AppendHeaders([
            (header::SET_COOKIE, format!("session={session}; Path=/; HttpOnly")),
            (header::SET_COOKIE, "theme=dark; Path=/".to_string()),
        ]),
        Json(Session { session }),
    )
}

async fn profile(
    State(sessions): State<Sessions>,
    headers: HeaderMap,
) -> Result<Json<Profile>, (StatusCode, Json<serde_json::Value>)> {
    if header_str(&headers, header::AUTHORIZATION.as_str())
        .is_some_and(|auth| auth == format!("Bearer {SERVICE_TOKEN}"))
    {
        return Ok(Json(Profile {
            user: "service".to_string(),
            via: "bearer".to_string(),
        }));
    }

    let session = header_str(&headers, header::COOKIE.as_str())
        .and_then(|cookies| session_from_cookies(&cookies));
    match session {
        Some(id) if sessions.read().await.contains(&id) => Ok(Json(Profile {
            user: "alice".to_string(),
            via: "cookie".to_string(),
        })),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "unauthorized"})),
        )),
    }
}

async fn echo(headers: HeaderMap) -> Json<Echo> {
    Json(Echo {
        cookie: header_str(&headers, header::COOKIE.as_str()),
        authorization: header_str(&headers, header::AUTHORIZATION.as_str()),
    })
}

async fn greeting() -> &'static str {
    "hello"
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded")
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Session id carried by a `Cookie` header, if any.
pub fn session_from_cookies(cookies: &str) -> Option<Uuid> {
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == "session")
        .and_then(|(_, value)| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_is_found_among_other_cookies() {
        let id = Uuid::new_v4();
        let cookies = format!("theme=dark; session={id}; lang=en");
        assert_eq!(session_from_cookies(&cookies), Some(id));
    }

    #[test]
    fn malformed_session_is_ignored() {
        assert_eq!(session_from_cookies("session=not-a-uuid"), None);
        assert_eq!(session_from_cookies("theme=dark"), None);
        assert_eq!(session_from_cookies(""), None);
    }

    #[test]
    fn echo_serializes_missing_headers_as_null() {
        let echo = Echo {
            cookie: None,
            authorization: Some("Bearer x".to_string()),
        };
        let json = serde_json::to_value(&echo).unwrap();
        assert_eq!(json["cookie"], serde_json::Value::Null);
        assert_eq!(json["authorization"], "Bearer x");
    }
}
