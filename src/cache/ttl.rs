//! Time-to-live cache for template output.
//!
//! Template resources run a producer on every request unless a fresh artifact
//! exists for the same (resource directory, query). Producers opt in by
//! declaring `cache-for: <seconds>` in their settings block.
//!
//! The read → delete-if-expired → regenerate → overwrite sequence is not atomic
//! across concurrent requests: two requests may both regenerate, and a request
//! that observed an expired artifact may remove one written just after its read.
//! Writes go through a temporary file and a rename, so a reader only ever sees a
//! complete artifact.

use std::{
    io::{self, ErrorKind, Write},
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use metrics::{counter, histogram};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::{
    assemble::PageAssembler,
    produce::{ProduceError, Producer},
};
use crate::domain::page::Page;

use super::{artifact, clock::Clock, config::CacheConfig, keys};

pub const METRIC_TTL_HIT: &str = "quire_ttl_hit_total";
pub const METRIC_TTL_MISS: &str = "quire_ttl_miss_total";
pub const METRIC_TTL_EXPIRED: &str = "quire_ttl_expired_total";
pub const METRIC_TTL_PERSIST: &str = "quire_ttl_persist_total";
pub const METRIC_TTL_PERSIST_FAILED: &str = "quire_ttl_persist_failed_total";
pub const METRIC_PRODUCE_MS: &str = "quire_produce_ms";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("artifact i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("artifact writer task failed: {0}")]
    Join(String),
}

pub struct TemplateCache {
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    assembler: PageAssembler,
    producer: Arc<dyn Producer>,
}

impl TemplateCache {
    pub fn new(
        config: CacheConfig,
        clock: Arc<dyn Clock>,
        assembler: PageAssembler,
        producer: Arc<dyn Producer>,
    ) -> Self {
        Self {
            config,
            clock,
            assembler,
            producer,
        }
    }

    /// Serve a fresh artifact or run the producer and maybe persist its output.
    ///
    /// Persistence failures are logged; the freshly assembled page is returned
    /// either way.
    pub async fn get_or_compute(
        &self,
        resource_dir: &Path,
        script: &Path,
        query: &str,
    ) -> Result<Page, ProduceError> {
        if self.config.enabled {
            if let Some(page) = self.lookup(resource_dir, query).await {
                counter!(METRIC_TTL_HIT).increment(1);
                return Ok(page);
            }
            counter!(METRIC_TTL_MISS).increment(1);
        }

        let started_at = Instant::now();
        let raw = self.producer.produce(script, query).await?;
        histogram!(METRIC_PRODUCE_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);

        let page = self.assembler.assemble(resource_dir, &raw).await;

        if !self.config.enabled {
            return Ok(page);
        }

        if let Some(seconds) = artifact::cache_for(page.settings()) {
            match self.persist(resource_dir, query, &raw, seconds).await {
                Ok(path) => {
                    counter!(METRIC_TTL_PERSIST).increment(1);
                    info!(
                        target = "cache::ttl",
                        op = "ttl::persist",
                        result = "stored",
                        resource = %resource_dir.display(),
                        artifact = %path.display(),
                        cache_for = seconds,
                        "Template output cached"
                    );
                }
                Err(err) => {
                    counter!(METRIC_TTL_PERSIST_FAILED).increment(1);
                    warn!(
                        target = "cache::ttl",
                        op = "ttl::persist",
                        result = "error",
                        resource = %resource_dir.display(),
                        error = %err,
                        "Failed to persist template output; serving uncached"
                    );
                }
            }
        }

        Ok(page)
    }

    /// Return the cached page for `(resource_dir, query)` if it has not expired.
    ///
    /// An expired or unreadable-expiry artifact is deleted and reported as a miss.
    pub async fn lookup(&self, resource_dir: &Path, query: &str) -> Option<Page> {
        let path = keys::artifact_path(resource_dir, query);
        let cached = match tokio::fs::read_to_string(&path).await {
            Ok(cached) => cached,
            Err(err) if err.kind() == ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(
                    target = "cache::ttl",
                    op = "ttl::lookup",
                    result = "read_error",
                    artifact = %path.display(),
                    error = %err,
                    "Failed to read template artifact; regenerating"
                );
                return None;
            }
        };

        let page = self.assembler.assemble(resource_dir, &cached).await;
        let now = self.clock.now_unix();

        match artifact::expires_at(page.settings()) {
            Some(expires_at) if now < expires_at => {
                debug!(
                    target = "cache::ttl",
                    op = "ttl::lookup",
                    result = "hit",
                    artifact = %path.display(),
                    ttl_remaining = expires_at - now,
                    "Template artifact served"
                );
                Some(page)
            }
            expires_at => {
                counter!(METRIC_TTL_EXPIRED).increment(1);
                debug!(
                    target = "cache::ttl",
                    op = "ttl::lookup",
                    result = "expired",
                    artifact = %path.display(),
                    expires_at = expires_at.unwrap_or_default(),
                    now,
                    "Template artifact expired"
                );
                remove_artifact(&path).await;
                None
            }
        }
    }

    /// Write `raw_content` behind an expiry header, replacing any existing artifact.
    pub async fn persist(
        &self,
        resource_dir: &Path,
        query: &str,
        raw_content: &str,
        cache_for: u64,
    ) -> Result<PathBuf, CacheError> {
        let generated_at = self.clock.now_unix();
        let lifetime = i64::try_from(cache_for).unwrap_or(i64::MAX);
        let expires_at = generated_at.saturating_add(lifetime);
        let contents = artifact::encode(raw_content, generated_at, expires_at);

        let dir = resource_dir.to_path_buf();
        let path = keys::artifact_path(resource_dir, query);
        let target = path.clone();

        tokio::task::spawn_blocking(move || write_atomically(&dir, &target, &contents))
            .await
            .map_err(|err| CacheError::Join(err.to_string()))??;

        Ok(path)
    }
}

fn write_atomically(dir: &Path, path: &Path, contents: &str) -> Result<(), CacheError> {
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(contents.as_bytes())?;
    staged.flush()?;
    staged.persist(path).map_err(|err| CacheError::Io(err.error))?;
    Ok(())
}

async fn remove_artifact(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        // Another request removed it first.
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            warn!(
                target = "cache::ttl",
                op = "ttl::remove",
                result = "error",
                artifact = %path.display(),
                error = %err,
                "Failed to delete expired template artifact"
            );
        }
    }
}
