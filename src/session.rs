//! In-memory session store
//!
//! Sessions are keyed by an opaque decimal id carried in the
//! `X-Session-Id` cookie. Every connection presenting the same id gets the
//! same `Arc<Session>`, so values written by one request are visible to the
//! next. Sessions idle for longer than the TTL are evicted, either lazily on
//! lookup or by the sweeper task that runs while the server is up.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use rand::Rng;
use thiserror::Error;
use tokio::sync::broadcast;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "X-Session-Id";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("session `{0}` not found")]
pub struct SessionNotFound(pub String);

/// Server-side state for one client.
#[derive(Debug)]
pub struct Session {
    id: String,
    values: DashMap<String, String>,
    last_touch: Mutex<Instant>,
}

impl Session {
    fn new(id: String) -> Self {
        Self {
            id,
            values: DashMap::new(),
            last_touch: Mutex::new(Instant::now()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|v| v.value().clone())
    }

    /// Stores a value, returning the previous one.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.values.remove(key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.values.iter().map(|e| e.key().clone()).collect()
    }

    fn touch(&self) {
        *self.last_touch.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        let last = *self.last_touch.lock().unwrap_or_else(|e| e.into_inner());
        now.saturating_duration_since(last)
    }

    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        self.idle_for(now) > ttl
    }
}

/// Concurrent map of session id to session. Cloning shares the same store.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, Arc<Session>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Draws a fresh id uniformly from the non-negative range of an `i64`.
    pub fn generate_id() -> String {
        rand::thread_rng().gen_range(0..=i64::MAX).to_string()
    }

    /// Registers a session under `id`. If one already exists it is touched
    /// and returned, so concurrent creators share a single session.
    pub fn create(&self, id: &str) -> Arc<Session> {
        let session = self
            .sessions
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Session::new(id.to_string())))
            .value()
            .clone();
        session.touch();
        session
    }

    /// Looks up a live session and refreshes its last-touch time. An expired
    /// session is evicted and reported as missing.
    pub fn get(&self, id: &str) -> Result<Arc<Session>, SessionNotFound> {
        let now = Instant::now();
        let ttl = self.ttl;
        let removed = self
            .sessions
            .remove_if(id, |_, session| session.is_expired(now, ttl));
        if removed.is_some() {
            tracing::debug!(session = id, "session expired");
            return Err(SessionNotFound(id.to_string()));
        }

        let session = self
            .sessions
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SessionNotFound(id.to_string()))?;
        session.touch();
        Ok(session)
    }

    /// Resolves the session for `id`, re-adopting the id when the store has
    /// no live session for it.
    pub fn get_or_create(&self, id: &str) -> Arc<Session> {
        match self.get(id) {
            Ok(session) => session,
            Err(_) => self.create(id),
        }
    }

    pub fn exists(&self, id: &str) -> bool {
        self.sessions
            .get(id)
            .is_some_and(|entry| !entry.value().is_expired(Instant::now(), self.ttl))
    }

    pub fn remove(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.remove(id).map(|(_, session)| session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Evicts every session idle for longer than the TTL. Returns how many
    /// were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| !session.is_expired(now, self.ttl));
        before.saturating_sub(self.sessions.len())
    }

    /// Periodically sweeps expired sessions until `shutdown` fires.
    pub async fn run_sweeper(self, every: Duration, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = ticker.tick() => {
                    let evicted = self.sweep_expired();
                    if evicted > 0 {
                        tracing::debug!(evicted, remaining = self.len(), "swept expired sessions");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_get_returns_same_session() {
        let store = SessionStore::new(Duration::from_secs(900));
        let created = store.create("42");
        created.set("user", "alice");

        let fetched = store.get("42").unwrap();
        assert!(Arc::ptr_eq(&created, &fetched));
        assert_eq!(fetched.get("user").as_deref(), Some("alice"));
    }

    #[test]
    fn create_is_idempotent_for_existing_id() {
        let store = SessionStore::new(Duration::from_secs(900));
        let first = store.create("7");
        first.set("k", "v");
        let second = store.create("7");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn missing_session_is_an_error() {
        let store = SessionStore::new(Duration::from_secs(900));
        assert_eq!(
            store.get("nope").unwrap_err(),
            SessionNotFound("nope".to_string())
        );
        assert!(!store.exists("nope"));
    }

    #[test]
    fn expired_sessions_are_swept() {
        let store = SessionStore::new(Duration::ZERO);
        store.create("1");
        store.create("2");
        std::thread::sleep(Duration::from_millis(5));

        assert_eq!(store.sweep_expired(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn expired_session_is_evicted_on_get() {
        let store = SessionStore::new(Duration::ZERO);
        store.create("1");
        std::thread::sleep(Duration::from_millis(5));

        assert!(store.get("1").is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn generated_ids_are_decimal() {
        let id = SessionStore::generate_id();
        assert!(!id.is_empty());
        assert!(id.parse::<i64>().unwrap() >= 0);
    }
}
