mod common;

use common::peer;
use tinyweb::http::parser::{ParseError, parse_http_request};
use tinyweb::http::request::Method;

#[test]
fn test_parse_simple_get_request() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let (parsed, consumed) = parse_http_request(req, peer()).unwrap();

    assert_eq!(parsed.method, Method::GET);
    assert_eq!(parsed.uri, "/");
    assert_eq!(parsed.host, "example.com");
    assert_eq!(parsed.header("Host"), Some("example.com"));
    assert!(parsed.body.is_none());
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_post_request_with_form_body() {
    let req = b"POST /echo HTTP/1.1\r\nHost: localhost\r\nContent-Length: 7\r\n\r\na=1&b=2";
    let (parsed, consumed) = parse_http_request(req, peer()).unwrap();

    assert_eq!(parsed.method, Method::POST);
    assert_eq!(parsed.uri, "/echo");
    assert_eq!(parsed.body.as_deref(), Some("a=1&b=2"));
    assert_eq!(parsed.param("a"), Some("1"));
    assert_eq!(parsed.param("b"), Some("2"));
    assert_eq!(parsed.body_params.len(), 2);
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_multiple_headers_last_one_wins() {
    let req = b"GET /path HTTP/1.1\r\nHost: example.com\r\nAccept: text/html\r\nUser-Agent: test-client\r\nAccept: */*\r\n\r\n";
    let (parsed, _) = parse_http_request(req, peer()).unwrap();

    assert_eq!(parsed.header("User-Agent"), Some("test-client"));
    assert_eq!(parsed.header("Accept"), Some("*/*"));
}

#[test]
fn test_header_value_keeps_everything_after_first_colon() {
    let req = b"GET / HTTP/1.1\r\nReferer: http://example.com:8080/x\r\n\r\n";
    let (parsed, _) = parse_http_request(req, peer()).unwrap();

    assert_eq!(parsed.header("Referer"), Some("http://example.com:8080/x"));
}

#[test]
fn test_parse_request_with_path_and_query_string() {
    let req = b"GET /search?q=rust&lang=en&flag HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let (parsed, _) = parse_http_request(req, peer()).unwrap();

    assert_eq!(parsed.uri, "/search");
    assert_eq!(parsed.query_param("q"), Some("rust"));
    assert_eq!(parsed.query_param("lang"), Some("en"));
    // pairs without '=' are dropped
    assert_eq!(parsed.query_params.len(), 2);
}

#[test]
fn test_parse_cookies() {
    let req = b"GET / HTTP/1.1\r\nCookie: X-Session-Id=123; theme=dark\r\n\r\n";
    let (parsed, _) = parse_http_request(req, peer()).unwrap();

    assert_eq!(parsed.cookie("X-Session-Id"), Some("123"));
    assert_eq!(parsed.cookie("theme"), Some("dark"));
}

#[test]
fn test_parse_incomplete_request_missing_blank_line() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n";
    let result = parse_http_request(req, peer());

    assert!(matches!(result, Err(ParseError::Incomplete)));
}

#[test]
fn test_parse_incomplete_request_partial_body() {
    let req = b"POST /api HTTP/1.1\r\nContent-Length: 10\r\n\r\nhello";
    let result = parse_http_request(req, peer());

    assert!(matches!(result, Err(ParseError::Incomplete)));
}

#[test]
fn test_parse_invalid_http_method() {
    let req = b"INVALID / HTTP/1.1\r\n\r\n";
    let result = parse_http_request(req, peer());

    assert!(matches!(result, Err(ParseError::Malformed(_))));
}

#[test]
fn test_parse_short_request_line() {
    let req = b"GET /\r\n\r\n";
    let result = parse_http_request(req, peer());

    assert!(matches!(result, Err(ParseError::Malformed(_))));
}

#[test]
fn test_parse_wrong_protocol_version() {
    let req = b"GET /x HTTP/1.0\r\n\r\n";
    let result = parse_http_request(req, peer());

    assert_eq!(
        result.unwrap_err(),
        ParseError::UnsupportedVersion("HTTP/1.0".to_string())
    );
}

#[test]
fn test_protocol_checked_before_method() {
    let req = b"BREW /pot HTTP/2.0\r\n\r\n";
    let result = parse_http_request(req, peer());

    assert!(matches!(result, Err(ParseError::UnsupportedVersion(_))));
}

#[test]
fn test_parse_malformed_header() {
    let req = b"GET / HTTP/1.1\r\nBrokenHeader\r\n\r\n";
    let result = parse_http_request(req, peer());

    assert!(matches!(result, Err(ParseError::Malformed(_))));
}

#[test]
fn test_post_without_content_length_requires_length() {
    for method in ["POST", "PUT", "PATCH"] {
        let req = format!("{method} /echo HTTP/1.1\r\nHost: x\r\n\r\na=1");
        let result = parse_http_request(req.as_bytes(), peer());

        assert!(
            matches!(result, Err(ParseError::LengthRequired(_))),
            "{method} should require Content-Length"
        );
    }
}

#[test]
fn test_negative_or_garbage_content_length() {
    for value in ["-1", "abc", ""] {
        let req = format!("POST /echo HTTP/1.1\r\nContent-Length: {value}\r\n\r\n");
        let result = parse_http_request(req.as_bytes(), peer());

        assert_eq!(result.unwrap_err(), ParseError::InvalidContentLength);
    }
}

#[test]
fn test_bodyless_methods_ignore_content_length() {
    let req = b"GET / HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";
    let (parsed, consumed) = parse_http_request(req, peer()).unwrap();

    assert!(parsed.body.is_none());
    assert!(parsed.body_params.is_empty());
    assert_eq!(consumed, req.len() - 5);
}

#[test]
fn test_parse_various_http_methods() {
    let methods = vec![
        ("GET", Method::GET),
        ("POST", Method::POST),
        ("PUT", Method::PUT),
        ("DELETE", Method::DELETE),
        ("HEAD", Method::HEAD),
        ("PATCH", Method::PATCH),
    ];

    for (method_str, expected_method) in methods {
        let req = format!("{method_str} / HTTP/1.1\r\nContent-Length: 0\r\n\r\n");
        let (parsed, _) = parse_http_request(req.as_bytes(), peer()).unwrap();
        assert_eq!(parsed.method, expected_method);
    }
}

#[test]
fn test_parse_request_with_empty_body() {
    let req = b"POST /api HTTP/1.1\r\nContent-Length: 0\r\n\r\n";
    let (parsed, _) = parse_http_request(req, peer()).unwrap();

    assert_eq!(parsed.body.as_deref(), Some(""));
}

#[test]
fn test_parse_request_with_utf8_body() {
    let body = "name=Jürgen";
    let req = format!(
        "PUT /user HTTP/1.1\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    );
    let (parsed, _) = parse_http_request(req.as_bytes(), peer()).unwrap();

    assert_eq!(parsed.param("name"), Some("Jürgen"));
}

#[test]
fn test_last_host_line_wins_regardless_of_case() {
    let req = b"GET / HTTP/1.1\r\nHost: first.example\r\nhost: second.example\r\n\r\n";
    let (parsed, _) = parse_http_request(req, peer()).unwrap();

    assert_eq!(parsed.host, "second.example");
}
