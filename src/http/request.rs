use std::collections::HashMap;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use crate::session::Session;

/// HTTP request methods understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// PATCH - Partial modification of a resource
    PATCH,
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// # Example
    ///
    /// ```
    /// # use tinyweb::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// assert_eq!(Method::from_str("OPTIONS"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            "HEAD" => Some(Method::HEAD),
            "PATCH" => Some(Method::PATCH),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::HEAD => "HEAD",
            Method::PATCH => "PATCH",
        }
    }

    /// Methods whose requests carry a body and therefore need Content-Length.
    pub fn carries_body(&self) -> bool {
        matches!(self, Method::POST | Method::PUT | Method::PATCH)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed HTTP request.
///
/// Built once per connection by the parser. The only later change is the
/// session attached by the router before any handler sees the request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Request path with the query string removed (e.g. "/index.html")
    pub uri: String,
    /// Value of the Host header, empty if the client sent none
    pub host: String,
    /// Body decoded as UTF-8; only present for POST/PUT/PATCH
    pub body: Option<String>,
    /// Request headers, last occurrence wins
    pub headers: HashMap<String, String>,
    pub cookies: HashMap<String, String>,
    pub query_params: HashMap<String, String>,
    /// Form fields decoded from the body
    pub body_params: HashMap<String, String>,
    pub peer_addr: SocketAddr,
    session: Option<Arc<Session>>,
}

/// Builder for constructing Request objects outside the parser.
pub struct RequestBuilder {
    method: Option<Method>,
    uri: Option<String>,
    headers: HashMap<String, String>,
    cookies: HashMap<String, String>,
    body: Option<String>,
    peer_addr: SocketAddr,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            uri: None,
            headers: HashMap::new(),
            cookies: HashMap::new(),
            body: None,
            peer_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the request target. A query string, if any, becomes `query_params`.
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn peer_addr(mut self, addr: SocketAddr) -> Self {
        self.peer_addr = addr;
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        let method = self.method.ok_or("method missing")?;
        let target = self.uri.ok_or("uri missing")?;
        let (uri, query) = split_target(&target);
        let host = self.headers.get("Host").cloned().unwrap_or_default();
        let body = if method.carries_body() {
            Some(self.body.unwrap_or_default())
        } else {
            None
        };
        let body_params = body.as_deref().map(parse_params).unwrap_or_default();

        Ok(Request {
            method,
            uri: uri.to_string(),
            host,
            body,
            headers: self.headers,
            cookies: self.cookies,
            query_params: query.map(parse_params).unwrap_or_default(),
            body_params,
            peer_addr: self.peer_addr,
            session: None,
        })
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Request {
    /// Retrieves a header value by name. An exact match is preferred, then a
    /// case-insensitive one.
    pub fn header(&self, key: &str) -> Option<&str> {
        if let Some(v) = self.headers.get(key) {
            return Some(v.as_str());
        }
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(|v| v.as_str())
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query_params.get(key).map(|v| v.as_str())
    }

    /// Form field from the request body.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.body_params.get(key).map(|v| v.as_str())
    }

    /// The session resolved for this connection, once the router attached it.
    pub fn session(&self) -> Option<&Arc<Session>> {
        self.session.as_ref()
    }

    pub(crate) fn with_session(mut self, session: Arc<Session>) -> Self {
        self.session = Some(session);
        self
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        method: Method,
        uri: String,
        host: String,
        body: Option<String>,
        headers: HashMap<String, String>,
        cookies: HashMap<String, String>,
        query: Option<&str>,
        peer_addr: SocketAddr,
    ) -> Self {
        let body_params = body.as_deref().map(parse_params).unwrap_or_default();
        Request {
            method,
            uri,
            host,
            body,
            headers,
            cookies,
            query_params: query.map(parse_params).unwrap_or_default(),
            body_params,
            peer_addr,
            session: None,
        }
    }
}

/// Splits a request target on the first `?`.
pub fn split_target(target: &str) -> (&str, Option<&str>) {
    match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    }
}

/// Parses `&`-separated `key=value` pairs. Pairs without `=` are dropped.
///
/// # Example
///
/// ```
/// # use tinyweb::http::request::parse_params;
/// let params = parse_params("a=1&b=2&flag");
/// assert_eq!(params.get("a").map(String::as_str), Some("1"));
/// assert_eq!(params.get("b").map(String::as_str), Some("2"));
/// assert!(!params.contains_key("flag"));
/// ```
pub fn parse_params(text: &str) -> HashMap<String, String> {
    text.split('&')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Parses the value of a `Cookie` header (`a=1; b=2`).
pub fn parse_cookies(value: &str) -> HashMap<String, String> {
    value
        .split("; ")
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}
