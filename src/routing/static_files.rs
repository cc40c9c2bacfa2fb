//! Serves files from a content root under a URL prefix.

use std::path::{Path, PathBuf};

use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};
use crate::routing::handler::{Handler, HandlerResult};

/// Outcome of mapping a URI onto the content root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    File(PathBuf),
    Missing,
    /// The path tries to leave the content root.
    Forbidden,
}

#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    prefix: String,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `uri` falls under this handler's prefix. The prefix must end
    /// on a path segment boundary.
    pub fn matches(&self, uri: &str) -> bool {
        uri.strip_prefix(&self.prefix).is_some_and(|rest| {
            rest.is_empty() || rest.starts_with('/') || self.prefix.ends_with('/')
        })
    }

    /// Maps a request URI onto the content root.
    pub fn resolve(&self, uri: &str) -> Resolved {
        let relative = uri.strip_prefix(&self.prefix).unwrap_or(uri);

        if relative.contains('\0') || relative.split('/').any(|segment| segment == "..") {
            return Resolved::Forbidden;
        }

        let candidate = self.root.join(relative.trim_start_matches('/'));
        let (Ok(canonical), Ok(canonical_root)) = (candidate.canonicalize(), self.root.canonicalize())
        else {
            return Resolved::Missing;
        };

        // symlinks may still point outside the root
        if !canonical.starts_with(&canonical_root) {
            return Resolved::Forbidden;
        }

        if canonical.is_file() {
            Resolved::File(canonical)
        } else {
            Resolved::Missing
        }
    }
}

impl Handler for StaticFiles {
    fn on_get(&self, request: &Request) -> HandlerResult {
        match self.resolve(&request.uri) {
            Resolved::File(path) => match Response::file(&path) {
                Ok(response) => Ok(response),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Response::not_found()),
                Err(e) => Err(e.into()),
            },
            Resolved::Missing => Ok(Response::not_found()),
            Resolved::Forbidden => {
                tracing::warn!(uri = %request.uri, peer = %request.peer_addr, "rejected path outside content root");
                Ok(Response::status_only(StatusCode::Forbidden))
            }
        }
    }
}
