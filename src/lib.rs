//! tinyweb - a minimal HTTP/1.1 application server
//!
//! Accepts TCP connections, parses requests by hand, routes them to
//! registered handlers or a static-file fallback, attaches a cookie-based
//! session and writes one response per connection.

pub mod config;
pub mod error;
pub mod http;
pub mod routing;
pub mod server;
pub mod session;

pub use config::Config;
pub use error::{ErrorKind, RequestError, ServerError};
pub use http::request::{Method, Request};
pub use http::response::{Response, StatusCode};
pub use routing::{Handler, MethodHandler};
pub use server::{ServerState, WebServer};
