use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::http::mime;

/// Headers written by the server itself. Callers may not set them.
pub const RESTRICTED_HEADERS: [&str; 4] = ["Server", "Content-Type", "Content-Length", "Connection"];

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
pub const TEXT_HTML: &str = "text/html; charset=utf-8";

/// HTTP status codes supported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// 200
    Ok,
    /// 202
    Accepted,
    /// 301
    MovedPermanently,
    /// 302
    MovedTemporarily,
    /// 303
    SeeOther,
    /// 400
    BadRequest,
    /// 401
    Unauthorized,
    /// 403
    Forbidden,
    /// 404
    NotFound,
    /// 405
    MethodNotAllowed,
    /// 408
    RequestTimeout,
    /// 411
    LengthRequired,
    /// 500
    InternalServerError,
    /// 501
    NotImplemented,
    /// 503
    ServiceUnavailable,
    /// 505
    HttpVersionNotSupported,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use tinyweb::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::LengthRequired.as_u16(), 411);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::Accepted => 202,
            StatusCode::MovedPermanently => 301,
            StatusCode::MovedTemporarily => 302,
            StatusCode::SeeOther => 303,
            StatusCode::BadRequest => 400,
            StatusCode::Unauthorized => 401,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::RequestTimeout => 408,
            StatusCode::LengthRequired => 411,
            StatusCode::InternalServerError => 500,
            StatusCode::NotImplemented => 501,
            StatusCode::ServiceUnavailable => 503,
            StatusCode::HttpVersionNotSupported => 505,
        }
    }

    /// Returns the reason phrase written on the status line.
    ///
    /// # Example
    ///
    /// ```
    /// # use tinyweb::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "Ok");
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "Ok",
            StatusCode::Accepted => "Accepted",
            StatusCode::MovedPermanently => "Moved permanently",
            StatusCode::MovedTemporarily => "Moved temporarily",
            StatusCode::SeeOther => "See other",
            StatusCode::BadRequest => "Bad request",
            StatusCode::Unauthorized => "Unauthorized",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not found",
            StatusCode::MethodNotAllowed => "Method not allowed",
            StatusCode::RequestTimeout => "Request Timeout",
            StatusCode::LengthRequired => "Length required",
            StatusCode::InternalServerError => "Internal server error",
            StatusCode::NotImplemented => "Not implemented",
            StatusCode::ServiceUnavailable => "Service unavailable",
            StatusCode::HttpVersionNotSupported => "HTTP version not supported",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    #[error("header `{0}` is set by the server and cannot be specified manually")]
    Restricted(String),
}

/// What gets written after the header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    Bytes(Vec<u8>),
    /// Streamed from disk when the response is written.
    File(PathBuf),
}

/// An HTTP response, mutable until it is written.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    content_type: String,
    body: ResponseBody,
    content_length: u64,
    headers: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
}

impl Response {
    pub fn raw(status: StatusCode, content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        Self {
            status,
            content_type: content_type.into(),
            content_length: body.len() as u64,
            body: ResponseBody::Bytes(body),
            headers: Vec::new(),
            cookies: Vec::new(),
        }
    }

    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self::raw(status, TEXT_PLAIN, body.into().into_bytes())
    }

    pub fn html(status: StatusCode, body: impl Into<String>) -> Self {
        Self::raw(status, TEXT_HTML, body.into().into_bytes())
    }

    /// A file-backed response. The file length becomes the Content-Length and
    /// the content type comes from [`mime::detect`].
    pub fn file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a regular file", path.display()),
            ));
        }

        Ok(Self {
            status: StatusCode::Ok,
            content_type: mime::detect(path),
            body: ResponseBody::File(path.to_path_buf()),
            content_length: metadata.len(),
            headers: Vec::new(),
            cookies: Vec::new(),
        })
    }

    /// 303 See Other pointing at `location`.
    pub fn redirect(location: impl Into<String>) -> Self {
        let mut response = Self::text(StatusCode::SeeOther, "Redirection");
        response.headers.push(("Location".to_string(), location.into()));
        response
    }

    /// A plain-text response whose body is the status line text, e.g. "404 Not found".
    pub fn status_only(status: StatusCode) -> Self {
        Self::text(status, status.to_string())
    }

    pub fn ok() -> Self {
        Self::text(StatusCode::Ok, "Ok")
    }

    pub fn not_found() -> Self {
        Self::status_only(StatusCode::NotFound)
    }

    pub fn method_not_allowed() -> Self {
        Self::status_only(StatusCode::MethodNotAllowed)
    }

    pub fn internal_error() -> Self {
        Self::status_only(StatusCode::InternalServerError)
    }

    /// 500 carrying the rendered error chain.
    pub fn exception(err: &anyhow::Error) -> Self {
        Self::text(StatusCode::InternalServerError, format!("{err:?}"))
    }

    /// Adds a header, replacing the value of an existing one with the same
    /// name while keeping its position.
    pub fn add_header(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<&mut Self, HeaderError> {
        let key = key.into();
        let key = key.trim_end_matches(':').to_string();
        if RESTRICTED_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(&key)) {
            return Err(HeaderError::Restricted(key));
        }

        let value = value.into();
        match self.headers.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.headers.push((key, value)),
        }
        Ok(self)
    }

    /// Consuming variant of [`Response::add_header`] for chained construction.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Result<Self, HeaderError> {
        self.add_header(key, value)?;
        Ok(self)
    }

    pub fn add_cookie(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.cookies.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.cookies.push((name, value)),
        }
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// In-memory body bytes, `None` for file-backed responses.
    pub fn body_bytes(&self) -> Option<&[u8]> {
        match &self.body {
            ResponseBody::Bytes(bytes) => Some(bytes),
            ResponseBody::File(_) => None,
        }
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// Extra headers in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn cookies(&self) -> &[(String, String)] {
        &self.cookies
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}
