//! Request routing
//!
//! Maps a request URI onto a [`Handler`], falling back to the static file
//! handler for URIs under the configured prefix.

pub mod handler;
pub mod router;
pub mod static_files;

pub use handler::{Handler, HandlerResult, MethodHandler};
pub use router::{ErrorListener, Router};
pub use static_files::StaticFiles;
