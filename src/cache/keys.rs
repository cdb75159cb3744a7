//! Cache key derivation for template artifacts.
//!
//! An artifact lives next to the template that produced it and is named after
//! the SHA-256 of the request query, so each (resource, query) pair maps to
//! exactly one file.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// File-name prefix shared by every persisted artifact.
pub const ARTIFACT_PREFIX: &str = "template.cached.";

/// Hex SHA-256 of the raw query string.
pub fn hash_query(query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn artifact_path(resource_dir: &Path, query: &str) -> PathBuf {
    resource_dir.join(format!("{ARTIFACT_PREFIX}{}", hash_query(query)))
}

pub fn is_artifact_name(file_name: &str) -> bool {
    file_name
        .strip_prefix(ARTIFACT_PREFIX)
        .is_some_and(|hash| hash.len() == 64 && hash.bytes().all(|b| b.is_ascii_hexdigit()))
}
