//! Status cache configuration.

use crate::core::{StatusError, StatusResult};

use std::time::Duration;

/// Configuration for the status cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// How long a snapshot is fresh, and the background refresh period.
    pub lifetime: Duration,

    /// How long an entry stays readable past its lifetime while the next
    /// refresh is in flight.
    pub stale_grace: Duration,

    /// Whether the background task refreshes as soon as it starts.
    pub refresh_on_start: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            lifetime: Duration::from_secs(300),
            stale_grace: Duration::from_secs(60),
            refresh_on_start: true,
        }
    }
}

impl CacheConfig {
    /// Creates a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the lifetime.
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Sets the stale grace period.
    pub fn with_stale_grace(mut self, grace: Duration) -> Self {
        self.stale_grace = grace;
        self
    }

    /// Enables or disables the refresh on start.
    pub fn with_refresh_on_start(mut self, enabled: bool) -> Self {
        self.refresh_on_start = enabled;
        self
    }

    /// Checks the lifetime is usable as a refresh period.
    ///
    /// # Errors
    ///
    /// Returns `StatusError::Configuration` for a zero lifetime.
    pub fn validate(&self) -> StatusResult<()> {
        check_lifetime(self.lifetime)
    }
}

pub(crate) fn check_lifetime(lifetime: Duration) -> StatusResult<()> {
    if lifetime.is_zero() {
        return Err(StatusError::configuration("cache lifetime must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.lifetime, Duration::from_secs(300));
        assert!(config.refresh_on_start);
    }

    #[test]
    fn test_config_builder() {
        let config = CacheConfig::new()
            .with_lifetime(Duration::from_secs(60))
            .with_stale_grace(Duration::ZERO)
            .with_refresh_on_start(false);
        assert_eq!(config.lifetime, Duration::from_secs(60));
        assert_eq!(config.stale_grace, Duration::ZERO);
        assert!(!config.refresh_on_start);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_lifetime_rejected() {
        let config = CacheConfig::new().with_lifetime(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(StatusError::Configuration { .. })
        ));
    }
}
