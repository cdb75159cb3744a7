//! Navigation controller: swaps pages in place and falls back to full loads.

use std::time::Duration;

use metrics::counter;
use quire_api_types::PageData;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::cache::{DEFAULT_MAX_CACHE_SIZE, PageCache};
use crate::document::{Document, PageMetadata};
use crate::fetch::{FetchError, PageFetcher};

pub const METRIC_FALLBACK: &str = "quire_navigator_fallback_total";

/// Deadline for an in-place navigation before a full load takes over.
pub const DEFAULT_NAVIGATION_TIMEOUT: Duration = Duration::from_millis(5_000);

const BLANK_TARGET: &str = "_blank";

#[derive(Debug, Clone)]
pub struct NavigatorConfig {
    pub max_cache_size: usize,
    pub timeout: Duration,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            timeout: DEFAULT_NAVIGATION_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    /// Link activation; records a history entry.
    Forward,
    /// History traversal; never records one.
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationState {
    Idle,
    Navigating,
    Completed,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSource {
    Cache,
    Network,
}

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("page fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("navigation did not finish within {0:?}")]
    Timeout(Duration),
}

#[derive(Debug)]
pub enum NavigationOutcome {
    Completed { url: Url, source: PageSource },
    Fallback { url: Url, reason: NavigationError },
}

impl NavigationOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, NavigationOutcome::Completed { .. })
    }
}

/// Drives one document. `&mut self` on every navigation keeps them serial.
pub struct Navigator<F, D> {
    config: NavigatorConfig,
    cache: PageCache,
    fetcher: F,
    document: D,
    state: NavigationState,
    intercepted: Vec<Url>,
}

impl<F, D> Navigator<F, D>
where
    F: PageFetcher,
    D: Document,
{
    /// Seeds the cache with the page already on screen and records the
    /// initial history entry.
    pub fn new(config: NavigatorConfig, fetcher: F, mut document: D) -> Self {
        let mut cache = PageCache::new(config.max_cache_size);
        let location = document.location().clone();
        let metadata = document.metadata();
        cache.insert(
            location.as_str(),
            PageData {
                content: document.main_html().to_string(),
                settings: Some(metadata.to_settings()),
            },
        );
        document.push_history(&location, &metadata.title);

        let mut navigator = Self {
            config,
            cache,
            fetcher,
            document,
            state: NavigationState::Idle,
            intercepted: Vec::new(),
        };
        navigator.bind_links();
        navigator
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    pub fn state(&self) -> NavigationState {
        self.state
    }

    /// Same-origin link targets currently handled in place.
    pub fn intercepted_links(&self) -> &[Url] {
        &self.intercepted
    }

    /// Resolves an anchor and decides whether it is handled in place.
    pub fn intercept(&self, href: &str, target: Option<&str>) -> Option<Url> {
        if target == Some(BLANK_TARGET) {
            return None;
        }
        let location = self.document.location();
        let url = location.join(href).ok()?;
        (url.origin() == location.origin()).then_some(url)
    }

    /// Handles an anchor activation. `None` leaves the link to the platform.
    pub async fn follow_link(
        &mut self,
        href: &str,
        target: Option<&str>,
    ) -> Option<NavigationOutcome> {
        let url = self.intercept(href, target)?;
        Some(self.navigate(&url, NavigationKind::Forward).await)
    }

    pub async fn back(&mut self, url: &Url) -> NavigationOutcome {
        self.navigate(url, NavigationKind::Back).await
    }

    /// Loads `url` in place, racing the load against the configured deadline.
    pub async fn navigate(&mut self, url: &Url, kind: NavigationKind) -> NavigationOutcome {
        self.state = NavigationState::Navigating;
        let timeout = self.config.timeout;

        let result = tokio::select! {
            result = self.load_page(url, kind) => Some(result),
            () = tokio::time::sleep(timeout) => None,
        };

        match result {
            Some(Ok(source)) => {
                self.state = NavigationState::Completed;
                info!(
                    target = "quire_navigator::controller",
                    url = %url,
                    source = ?source,
                    kind = ?kind,
                    "Navigated in place"
                );
                NavigationOutcome::Completed {
                    url: url.clone(),
                    source,
                }
            }
            Some(Err(err)) => self.fall_back(url, NavigationError::Fetch(err)),
            None => self.fall_back(url, NavigationError::Timeout(timeout)),
        }
    }

    async fn load_page(&mut self, url: &Url, kind: NavigationKind) -> Result<PageSource, FetchError> {
        let key = url.as_str();
        let (data, source) = match self.cache.get(key) {
            Some(data) => (data.clone(), PageSource::Cache),
            None => {
                let data = self.fetcher.fetch(url).await?;
                self.cache.insert(key, data.clone());
                (data, PageSource::Network)
            }
        };

        self.show(url, &data, kind);
        Ok(source)
    }

    fn show(&mut self, url: &Url, data: &PageData, kind: NavigationKind) {
        let metadata = PageMetadata::from_data(data);
        self.document.replace_main(&data.content);
        self.document.apply_metadata(&metadata);
        if kind == NavigationKind::Forward {
            self.document.push_history(url, &metadata.title);
        }
        self.bind_links();
        self.document.dispatch_load();
    }

    fn fall_back(&mut self, url: &Url, reason: NavigationError) -> NavigationOutcome {
        counter!(METRIC_FALLBACK).increment(1);
        warn!(
            target = "quire_navigator::controller",
            url = %url,
            error = %reason,
            "In-place navigation failed; loading the full page"
        );
        self.state = NavigationState::Fallback;
        self.document.navigate_fully(url);
        NavigationOutcome::Fallback {
            url: url.clone(),
            reason,
        }
    }

    fn bind_links(&mut self) {
        let links = self.document.links();
        self.intercepted = links
            .iter()
            .filter_map(|link| self.intercept(&link.href, link.target.as_deref()))
            .collect();
    }
}
