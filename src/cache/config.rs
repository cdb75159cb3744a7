//! Template cache configuration.

/// Runtime cache options, built from the loaded `[cache]` settings.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Read and write template artifacts. When off every request runs the producer.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_by_default() {
        assert!(CacheConfig::default().enabled);
    }

    #[test]
    fn follows_loaded_settings() {
        let settings = crate::config::CacheSettings { enabled: false };
        assert!(!CacheConfig::from(&settings).enabled);
    }
}
