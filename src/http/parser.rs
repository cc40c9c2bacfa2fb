use std::collections::HashMap;
use std::net::SocketAddr;

use thiserror::Error;

use crate::http::request::{Method, Request, parse_cookies, split_target};

/// The only protocol version the server speaks.
pub const PROTOCOL: &str = "HTTP/1.1";

/// Upper bound on the request line plus headers.
pub const MAX_HEAD_BYTES: usize = 64 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed request: {0}")]
    Malformed(&'static str),
    #[error("unsupported protocol version `{0}`")]
    UnsupportedVersion(String),
    #[error("invalid Content-Length header")]
    InvalidContentLength,
    #[error("Content-Length is required for {0} requests")]
    LengthRequired(Method),
    #[error("request head exceeds {MAX_HEAD_BYTES} bytes")]
    HeadTooLarge,
    /// More bytes are needed before the request can be parsed.
    #[error("incomplete request")]
    Incomplete,
}

/// Parses one request from the front of `buf`.
///
/// Returns the request and the number of bytes it occupied. Callers keep
/// reading and retry while this returns [`ParseError::Incomplete`].
pub fn parse_http_request(buf: &[u8], peer: SocketAddr) -> Result<(Request, usize), ParseError> {
    // Look for header/body separator
    let headers_end = match find_headers_end(buf) {
        Some(end) if end > MAX_HEAD_BYTES => return Err(ParseError::HeadTooLarge),
        Some(end) => end,
        None if buf.len() > MAX_HEAD_BYTES => return Err(ParseError::HeadTooLarge),
        None => return Err(ParseError::Incomplete),
    };
    let body_start = headers_end + 4;

    let head = std::str::from_utf8(&buf[..headers_end])
        .map_err(|_| ParseError::Malformed("request head is not valid UTF-8"))?;

    let mut lines = head.lines();

    // Request line
    let request_line = lines.next().unwrap_or_default();
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(ParseError::Malformed("bad request line"));
    }
    let (method_str, target, version) = (parts[0], parts[1], parts[2]);

    if version != PROTOCOL {
        return Err(ParseError::UnsupportedVersion(version.to_string()));
    }

    // Headers
    let mut headers = HashMap::new();
    let mut cookies = HashMap::new();
    let mut content_length = None;
    let mut host = None;

    for line in lines {
        if line.is_empty() {
            continue;
        }

        let (name, value) = line
            .split_once(':')
            .ok_or(ParseError::Malformed("header line without ':'"))?;
        let value = value.strip_prefix(' ').unwrap_or(value);

        if name.eq_ignore_ascii_case("Cookie") {
            cookies.extend(parse_cookies(value));
        } else if name.eq_ignore_ascii_case("Content-Length") {
            // first occurrence wins
            if content_length.is_none() {
                content_length = Some(parse_content_length(value)?);
            }
        } else {
            if name.eq_ignore_ascii_case("Host") {
                host = Some(value.to_string());
            }
            headers.insert(name.to_string(), value.to_string());
        }
    }

    let method = Method::from_str(method_str).ok_or(ParseError::Malformed("unknown method"))?;

    // Body
    let (body, consumed) = if method.carries_body() {
        let length = content_length.ok_or(ParseError::LengthRequired(method))?;
        let body_end = body_start
            .checked_add(length)
            .ok_or(ParseError::InvalidContentLength)?;
        if buf.len() < body_end {
            return Err(ParseError::Incomplete);
        }
        let body = String::from_utf8_lossy(&buf[body_start..body_end]).into_owned();
        (Some(body), body_end)
    } else {
        (None, body_start)
    };

    let (uri, query) = split_target(target);
    let host = host.unwrap_or_default();

    let request = Request::from_parts(
        method,
        uri.to_string(),
        host,
        body,
        headers,
        cookies,
        query,
        peer,
    );

    Ok((request, consumed))
}

fn parse_content_length(value: &str) -> Result<usize, ParseError> {
    let length: i64 = value
        .trim()
        .parse()
        .map_err(|_| ParseError::InvalidContentLength)?;
    usize::try_from(length).map_err(|_| ParseError::InvalidContentLength)
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}
