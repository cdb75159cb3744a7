//! Quire template cache.
//!
//! Template resources produce their content by running a script. When the
//! script's settings declare `cache-for: <seconds>`, the raw output is stored
//! next to the template as `template.cached.<sha256(query)>` and served until
//! it expires.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! ```

pub mod artifact;
mod clock;
mod config;
mod keys;
mod ttl;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use keys::{ARTIFACT_PREFIX, artifact_path, hash_query, is_artifact_name};
pub use ttl::{
    CacheError, METRIC_PRODUCE_MS, METRIC_TTL_EXPIRED, METRIC_TTL_HIT, METRIC_TTL_MISS,
    METRIC_TTL_PERSIST, METRIC_TTL_PERSIST_FAILED, TemplateCache,
};
