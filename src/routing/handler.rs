use std::sync::Arc;

use crate::http::request::{Method, Request};
use crate::http::response::Response;

pub type HandlerResult = anyhow::Result<Response>;

/// Application logic bound to one URI.
///
/// Implement the methods the resource supports; the rest answer
/// 405 Method Not Allowed. HEAD falls back to GET and the body is dropped
/// when the response is written.
pub trait Handler: Send + Sync {
    fn on_get(&self, _request: &Request) -> HandlerResult {
        Ok(Response::method_not_allowed())
    }

    fn on_post(&self, _request: &Request) -> HandlerResult {
        Ok(Response::method_not_allowed())
    }

    fn on_put(&self, _request: &Request) -> HandlerResult {
        Ok(Response::method_not_allowed())
    }

    fn on_delete(&self, _request: &Request) -> HandlerResult {
        Ok(Response::method_not_allowed())
    }

    fn on_patch(&self, _request: &Request) -> HandlerResult {
        Ok(Response::method_not_allowed())
    }

    fn on_head(&self, request: &Request) -> HandlerResult {
        self.on_get(request)
    }

    /// Dispatches on the request method.
    fn handle(&self, request: &Request) -> HandlerResult {
        match request.method {
            Method::GET => self.on_get(request),
            Method::POST => self.on_post(request),
            Method::PUT => self.on_put(request),
            Method::DELETE => self.on_delete(request),
            Method::PATCH => self.on_patch(request),
            Method::HEAD => self.on_head(request),
        }
    }
}

type HandlerFn = Arc<dyn Fn(&Request) -> HandlerResult + Send + Sync + 'static>;

/// A [`Handler`] assembled from per-method closures.
///
/// ```
/// # use tinyweb::http::response::{Response, StatusCode};
/// # use tinyweb::routing::MethodHandler;
/// let handler = MethodHandler::new()
///     .get(|_req| Ok(Response::ok()))
///     .post(|req| Ok(Response::text(StatusCode::Ok, req.body.clone().unwrap_or_default())));
/// # let _ = handler;
/// ```
#[derive(Clone, Default)]
pub struct MethodHandler {
    get: Option<HandlerFn>,
    post: Option<HandlerFn>,
    put: Option<HandlerFn>,
    delete: Option<HandlerFn>,
    patch: Option<HandlerFn>,
    head: Option<HandlerFn>,
}

macro_rules! method_setter {
    ($name:ident) => {
        pub fn $name<F>(mut self, f: F) -> Self
        where
            F: Fn(&Request) -> HandlerResult + Send + Sync + 'static,
        {
            self.$name = Some(Arc::new(f));
            self
        }
    };
}

impl MethodHandler {
    pub fn new() -> Self {
        Self::default()
    }

    method_setter!(get);
    method_setter!(post);
    method_setter!(put);
    method_setter!(delete);
    method_setter!(patch);
    method_setter!(head);

    fn call(f: &Option<HandlerFn>, request: &Request) -> HandlerResult {
        match f {
            Some(f) => f(request),
            None => Ok(Response::method_not_allowed()),
        }
    }
}

impl Handler for MethodHandler {
    fn on_get(&self, request: &Request) -> HandlerResult {
        Self::call(&self.get, request)
    }

    fn on_post(&self, request: &Request) -> HandlerResult {
        Self::call(&self.post, request)
    }

    fn on_put(&self, request: &Request) -> HandlerResult {
        Self::call(&self.put, request)
    }

    fn on_delete(&self, request: &Request) -> HandlerResult {
        Self::call(&self.delete, request)
    }

    fn on_patch(&self, request: &Request) -> HandlerResult {
        Self::call(&self.patch, request)
    }

    fn on_head(&self, request: &Request) -> HandlerResult {
        match &self.head {
            Some(f) => f(request),
            None => self.on_get(request),
        }
    }
}
