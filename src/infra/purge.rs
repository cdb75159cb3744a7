//! Offline removal of cached template artifacts.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::cache::is_artifact_name;

use super::error::InfraError;

#[derive(Debug, Default)]
pub struct PurgeReport {
    pub artifacts: Vec<PathBuf>,
    pub dry_run: bool,
}

impl PurgeReport {
    pub fn count(&self) -> usize {
        self.artifacts.len()
    }
}

/// Delete every `template.cached.<sha256>` file below `roots`. Missing roots are skipped.
pub fn purge_artifacts(roots: &[&Path], dry_run: bool) -> Result<PurgeReport, InfraError> {
    let mut report = PurgeReport {
        artifacts: Vec::new(),
        dry_run,
    };

    for root in roots {
        if !root.exists() {
            debug!(
                target = "infra::purge",
                root = %root.display(),
                "Skipping missing content directory"
            );
            continue;
        }

        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry.map_err(|err| {
                InfraError::Io(
                    err.into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
                )
            })?;

            if !entry.file_type().is_file() {
                continue;
            }
            let is_artifact = entry.file_name().to_str().is_some_and(is_artifact_name);
            if !is_artifact {
                continue;
            }

            if !dry_run {
                match std::fs::remove_file(entry.path()) {
                    Ok(()) => {}
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                    Err(err) => return Err(err.into()),
                }
            }
            report.artifacts.push(entry.into_path());
        }
    }

    info!(
        target = "infra::purge",
        op = "purge_artifacts",
        removed = report.count(),
        dry_run,
        "Template cache purge finished"
    );

    Ok(report)
}
