//! Client-side navigation for quire sites.
//!
//! After the first full page load a [`Navigator`] takes over same-origin link
//! activations: it serves pages from a small LRU of page data, fetches misses
//! with the `csr=true` marker, swaps the `<main>` region in place, and falls
//! back to a full page load when anything fails or the deadline passes.

pub mod cache;
pub mod controller;
pub mod document;
pub mod fetch;

pub use cache::{CacheItem, DEFAULT_MAX_CACHE_SIZE, PageCache};
pub use controller::{
    DEFAULT_NAVIGATION_TIMEOUT, NavigationError, NavigationKind, NavigationOutcome,
    NavigationState, Navigator, NavigatorConfig, PageSource,
};
pub use document::{Document, DocumentError, HeadlessDocument, Link, PageMetadata};
pub use fetch::{FetchError, HttpPageFetcher, PageFetcher, data_url};
