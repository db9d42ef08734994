//! In-memory store of per-browser session state.
//!
//! Sessions are keyed by a random UUID carried in the `ddx_session` cookie. Only the submission
//! handler writes; the page handler reads.

use axum::http::{header, HeaderMap, HeaderValue};
use ddx_core::SessionState;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "ddx_session";

/// Sessions untouched for this long are dropped on the next write.
const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, (SessionState, Instant)>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of a session; unknown sessions are `Idle`.
    pub async fn get(&self, id: Uuid) -> SessionState {
        self.inner
            .read()
            .await
            .get(&id)
            .map(|(state, _)| state.clone())
            .unwrap_or_default()
    }

    /// Replace a session's state.
    pub async fn set(&self, id: Uuid, state: SessionState) {
        let now = Instant::now();
        let mut sessions = self.inner.write().await;
        sessions.retain(|_, (_, touched)| now.duration_since(*touched) < SESSION_TTL);
        sessions.insert(id, (state, now));
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

/// Read the session id from the request's `Cookie` headers.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// `Set-Cookie` value that pins the browser to a session.
pub fn session_cookie(id: Uuid) -> HeaderValue {
    // A hyphenated UUID is always a valid header value.
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
        id.hyphenated()
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("ddx_session=; Path=/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ddx_core::Outcome;

    #[test]
    fn finds_session_among_other_cookies() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {SESSION_COOKIE}={id}; other=1"))
                .expect("header"),
        );
        assert_eq!(session_id_from_headers(&headers), Some(id));
    }

    #[test]
    fn ignores_missing_or_malformed_cookie() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_id_from_headers(&headers), None);

        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("ddx_session=not-a-uuid"),
        );
        assert_eq!(session_id_from_headers(&headers), None);
    }

    #[test]
    fn cookie_round_trips_through_headers() {
        let id = Uuid::new_v4();
        let set_cookie = session_cookie(id);
        let cookie_pair = set_cookie
            .to_str()
            .expect("ascii")
            .split(';')
            .next()
            .expect("pair")
            .to_string();

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(&cookie_pair).expect("header"));
        assert_eq!(session_id_from_headers(&headers), Some(id));
    }

    #[tokio::test]
    async fn store_defaults_to_idle_and_replaces_state() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();
        assert_eq!(store.get(id).await, SessionState::Idle);

        store.set(id, SessionState::Pending).await;
        store
            .set(id, SessionState::Resolved(Outcome::Result("done".into())))
            .await;

        assert_eq!(
            store.get(id).await,
            SessionState::Resolved(Outcome::Result("done".into()))
        );
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_sessions_are_dropped_on_write() {
        let store = SessionStore::new();
        let stale = Uuid::new_v4();
        let fresh = Uuid::new_v4();

        store.set(stale, SessionState::Pending).await;
        tokio::time::advance(SESSION_TTL - Duration::from_secs(60)).await;
        store.set(fresh, SessionState::Pending).await;
        assert_eq!(store.len().await, 2);

        tokio::time::advance(Duration::from_secs(120)).await;
        store.set(fresh, SessionState::Idle).await;

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(stale).await, SessionState::Idle);
        assert_eq!(store.get(fresh).await, SessionState::Idle);
    }
}
