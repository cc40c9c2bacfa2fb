//! HTTP/1.1 wire handling.
//!
//! Every connection carries exactly one request and is closed after the
//! response (`Connection: close`). There is no keep-alive, no chunked
//! encoding and no TLS.
//!
//! - **`connection`**: the per-connection state machine
//! - **`parser`**: parses a request from the connection's read buffer
//! - **`request`**: request representation, query/form/cookie parsing
//! - **`response`**: response representation and status codes
//! - **`writer`**: serializes a response onto the socket
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for request bytes (read timeout per read)
//!        └──────┬──────┘
//!               │ Request parsed        │ Parse error / timeout
//!               ▼                       │
//!        ┌──────────────────┐           │
//!        │   Processing     │ ← Route, attach session, run handler
//!        └──────┬───────────┘           │
//!               │ Response ready        │ Error response
//!               ▼                       ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Head, then body (suppressed for HEAD)
//!        └──────┬───────────┘
//!               ▼
//!            Closed
//! ```

pub mod connection;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
