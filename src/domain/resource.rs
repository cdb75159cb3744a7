//! Resource identities: where a page's content lives on disk.

use std::path::{Path, PathBuf};

pub const STATIC_PAGE_FILE: &str = "page.html";
pub const STYLES_FILE: &str = "styles.css";

/// How a resource obtains its raw content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSource {
    /// Raw content is read from `page.html`.
    Static(PathBuf),
    /// Raw content is produced by running a script.
    Template(PathBuf),
}

/// A resolvable content directory and the source of its raw content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    dir: PathBuf,
    source: ResourceSource,
}

impl Resource {
    pub fn new(dir: impl Into<PathBuf>, source: ResourceSource) -> Self {
        Self {
            dir: dir.into(),
            source,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn source(&self) -> &ResourceSource {
        &self.source
    }

    pub fn is_template(&self) -> bool {
        matches!(self.source, ResourceSource::Template(_))
    }
}

/// Map a request path onto a directory under `root`.
///
/// Returns `None` for paths that try to leave `root` (`..`, backslashes, NUL).
pub fn content_dir(root: &Path, request_path: &str) -> Option<PathBuf> {
    let mut dir = root.to_path_buf();
    for segment in request_path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            _ if segment.contains(['\\', '\0']) => return None,
            _ => dir.push(segment),
        }
    }
    Some(dir)
}
