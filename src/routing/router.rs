//! URI routing, session attachment and error translation.
//!
//! [`Router::dispatch`] and [`Router::translate`] are the boundary of a
//! connection worker: whatever a handler or an error listener does, they
//! return a [`Response`].

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::{ErrorKind, RequestError};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::routing::handler::{Handler, HandlerResult};
use crate::routing::static_files::StaticFiles;
use crate::session::{SESSION_COOKIE, SessionStore};

/// Builds a response for a failed request. Registered per [`ErrorKind`].
pub type ErrorListener = Arc<dyn Fn(&RequestError) -> anyhow::Result<Response> + Send + Sync + 'static>;

pub struct Router {
    handlers: DashMap<String, Arc<dyn Handler>>,
    listeners: DashMap<ErrorKind, ErrorListener>,
    static_files: Option<StaticFiles>,
    sessions: SessionStore,
}

impl Router {
    pub fn new(sessions: SessionStore, static_files: Option<StaticFiles>) -> Self {
        Self {
            handlers: DashMap::new(),
            listeners: DashMap::new(),
            static_files,
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Registers `handler` for `uri`, replacing any previous one. A missing
    /// leading `/` is added.
    pub fn add_handler<H>(&self, uri: &str, handler: H)
    where
        H: Handler + 'static,
    {
        self.handlers.insert(normalize_uri(uri), Arc::new(handler));
    }

    pub fn has_handler(&self, uri: &str) -> bool {
        self.handlers.contains_key(&normalize_uri(uri))
    }

    /// Overrides the response produced for errors of `kind`.
    pub fn on_error<F>(&self, kind: ErrorKind, listener: F)
    where
        F: Fn(&RequestError) -> anyhow::Result<Response> + Send + Sync + 'static,
    {
        self.listeners.insert(kind, Arc::new(listener));
    }

    /// Resolves the session, runs the matching handler and converts any
    /// failure into a response.
    pub fn dispatch(&self, request: Request) -> Response {
        let (request, new_session) = self.attach_session(request);

        let mut response = match self.route(&request) {
            Ok(response) => response,
            Err(err) => {
                let err = RequestError::Handler(err);
                tracing::error!(
                    method = %request.method,
                    uri = %request.uri,
                    peer = %request.peer_addr,
                    error = %err,
                    "handler failed"
                );
                self.translate(&err)
            }
        };

        if let Some(id) = new_session {
            response.add_cookie(SESSION_COOKIE, id);
        }

        tracing::debug!(
            method = %request.method,
            uri = %request.uri,
            status = response.status().as_u16(),
            "request handled"
        );
        response
    }

    fn route(&self, request: &Request) -> HandlerResult {
        if let Some(static_files) = self.static_files.as_ref().filter(|s| s.matches(&request.uri)) {
            return guarded(|| static_files.handle(request));
        }

        // clone the Arc so no map shard stays locked while the handler runs
        let handler = self
            .handlers
            .get(&request.uri)
            .map(|entry| entry.value().clone());

        match handler {
            Some(handler) => guarded(|| handler.handle(request)),
            None => Ok(Response::not_found()),
        }
    }

    /// Returns the request with its session attached, plus the id to send
    /// back in a cookie when the client did not present one.
    fn attach_session(&self, request: Request) -> (Request, Option<String>) {
        match request.cookie(SESSION_COOKIE).map(str::to_owned) {
            Some(id) => {
                let session = self.sessions.get_or_create(&id);
                (request.with_session(session), None)
            }
            None => {
                let id = SessionStore::generate_id();
                let session = self.sessions.create(&id);
                (request.with_session(session), Some(id))
            }
        }
    }

    /// Converts a request error into a response. Never panics; a failing
    /// listener degrades to a minimal 500.
    pub fn translate(&self, err: &RequestError) -> Response {
        let kind = err.kind();
        let listener = self.listeners.get(&kind).map(|entry| entry.value().clone());

        match listener {
            Some(listener) => match guarded(|| listener(err)) {
                Ok(response) => response,
                Err(listener_err) => {
                    tracing::error!(?kind, error = %listener_err, "error listener failed");
                    Response::internal_error()
                }
            },
            None => default_response(err),
        }
    }
}

fn default_response(err: &RequestError) -> Response {
    match err {
        RequestError::Handler(e) => Response::exception(e),
        _ => Response::status_only(err.kind().status()),
    }
}

/// Runs user code, turning a panic into an error.
fn guarded<F>(f: F) -> HandlerResult
where
    F: FnOnce() -> HandlerResult,
{
    catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(anyhow::anyhow!("panicked: {}", panic_message(&*payload))))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic payload"
    }
}

pub fn normalize_uri(uri: &str) -> String {
    if uri.starts_with('/') {
        uri.to_string()
    } else {
        format!("/{uri}")
    }
}
