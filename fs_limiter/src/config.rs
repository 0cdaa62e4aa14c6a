use std::time::Duration;

use crate::clock::Clock;
use crate::clock::duration_to_nanos;
use crate::error::RateLimitError;
use crate::error::Result;
use crate::limiter::Limiter;
use crate::store::Store;

/// Separator between namespace and item in store keys
pub const KEY_SEPARATOR: char = ':';

/// Limiter settings, immutable once a limiter is built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimiterConfig {
    pub(crate) namespace: String,
    pub(crate) interval: Duration,
    pub(crate) limit: u64,
}

impl LimiterConfig {
    /// Allow `limit` occurrences per item within any trailing `interval`
    pub fn new(namespace: impl Into<String>, interval: Duration, limit: u64) -> Self {
        Self { namespace: namespace.into(), interval, limit }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Validate the configuration
    ///
    /// The namespace must be non-empty and free of [`KEY_SEPARATOR`]; with that
    /// guarantee the first separator in a key always marks where the item starts,
    /// so items themselves may contain anything without two pairs colliding.
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(RateLimitError::InvalidConfig("namespace must not be empty"));
        }
        if self.namespace.contains(KEY_SEPARATOR) {
            return Err(RateLimitError::InvalidConfig("namespace must not contain ':'"));
        }
        if self.interval.is_zero() {
            return Err(RateLimitError::InvalidConfig("interval must be greater than 0"));
        }
        if duration_to_nanos(self.interval).is_none() {
            return Err(RateLimitError::InvalidConfig("interval must fit in i64 nanoseconds"));
        }
        Ok(())
    }
}

/// Builder for configuring a limiter
#[derive(Debug, Default)]
pub struct LimiterBuilder {
    namespace: Option<String>,
    interval: Option<Duration>,
    limit: Option<u64>,
}

impl LimiterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the key prefix
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the trailing window length
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Set the number of occurrences allowed per window
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set window to 1 second
    pub fn per_second(self, limit: u64) -> Self {
        self.limit(limit).interval(Duration::from_secs(1))
    }

    /// Set window to 1 minute
    pub fn per_minute(self, limit: u64) -> Self {
        self.limit(limit).interval(Duration::from_secs(60))
    }

    /// Set window to 1 hour
    pub fn per_hour(self, limit: u64) -> Self {
        self.limit(limit).interval(Duration::from_secs(3600))
    }

    /// Validated configuration
    pub fn config(self) -> Result<LimiterConfig> {
        let namespace = self.namespace.ok_or(RateLimitError::InvalidConfig("namespace must be set"))?;
        let interval = self.interval.ok_or(RateLimitError::InvalidConfig("interval must be set"))?;
        let limit = self.limit.ok_or(RateLimitError::InvalidConfig("limit must be set"))?;

        let config = LimiterConfig::new(namespace, interval, limit);
        config.validate()?;
        Ok(config)
    }

    /// Build a limiter over `store` reading time from `clock`
    pub fn build<S: Store, C: Clock>(self, store: S, clock: C) -> Result<Limiter<S, C>> {
        Limiter::new(self.config()?, store, clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = LimiterConfig::new("api", Duration::from_secs(5), 5);
        assert!(config.validate().is_ok());
        assert_eq!(config.namespace(), "api");
        assert_eq!(config.interval(), Duration::from_secs(5));
        assert_eq!(config.limit(), 5);
    }

    #[test]
    fn test_zero_limit_is_valid() {
        assert!(LimiterConfig::new("api", Duration::from_secs(1), 0).validate().is_ok());
    }

    #[test]
    fn test_invalid_configs() {
        let cases = [
            (LimiterConfig::new("", Duration::from_secs(1), 1), "namespace must not be empty"),
            (LimiterConfig::new("a:b", Duration::from_secs(1), 1), "namespace must not contain ':'"),
            (LimiterConfig::new("api", Duration::ZERO, 1), "interval must be greater than 0"),
            (LimiterConfig::new("api", Duration::MAX, 1), "interval must fit in i64 nanoseconds"),
        ];

        for (config, expected) in cases {
            match config.validate() {
                Err(RateLimitError::InvalidConfig(msg)) => assert_eq!(msg, expected),
                other => panic!("expected InvalidConfig({expected}), got {other:?}"),
            }
        }
    }

    #[test]
    fn test_builder() {
        let config = LimiterBuilder::new().namespace("login").per_minute(10).config().unwrap();
        assert_eq!(config, LimiterConfig::new("login", Duration::from_secs(60), 10));

        let config = LimiterBuilder::new().namespace("login").per_hour(3600).config().unwrap();
        assert_eq!(config.interval(), Duration::from_secs(3600));

        let config = LimiterBuilder::new().namespace("login").per_second(3).config().unwrap();
        assert_eq!(config.interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_builder_missing_fields() {
        assert!(matches!(LimiterBuilder::new().per_second(1).config(), Err(RateLimitError::InvalidConfig("namespace must be set"))));
        assert!(matches!(LimiterBuilder::new().namespace("a").limit(1).config(), Err(RateLimitError::InvalidConfig("interval must be set"))));
        assert!(matches!(
            LimiterBuilder::new().namespace("a").interval(Duration::from_secs(1)).config(),
            Err(RateLimitError::InvalidConfig("limit must be set"))
        ));
    }
}
