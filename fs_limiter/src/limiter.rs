use std::time::Duration;

use crate::clock::Clock;
use crate::clock::duration_to_nanos;
use crate::clock::timestamp_nanos;
use crate::config::KEY_SEPARATOR;
use crate::config::LimiterBuilder;
use crate::config::LimiterConfig;
use crate::error::RateLimitError;
use crate::error::Result;
use crate::store::Command;
use crate::store::Reply;
use crate::store::Store;
use crate::store::Transaction;

/// Distributed sliding-window rate limiter
///
/// Each item's window is an ordered set in the store, keyed by
/// `namespace:item`, holding the nanosecond timestamps of recent occurrences.
/// A [`pass`](Limiter::pass) prunes timestamps that fell out of the window,
/// records the current one and counts what is left, all in one store
/// transaction. Coordination between processes is left entirely to the store,
/// so a limiter can be shared freely behind an `Arc`.
pub struct Limiter<S, C> {
    config: LimiterConfig,

    /// Window length in nanoseconds
    interval_nanos: i64,

    store: S,

    clock: C,
}

impl<S: Store, C: Clock> Limiter<S, C> {
    /// Create a limiter from a configuration, a store handle and a time source
    ///
    /// # Errors
    /// Returns [`RateLimitError::InvalidConfig`] if the configuration does not validate.
    pub fn new(config: LimiterConfig, store: S, clock: C) -> Result<Self> {
        config.validate()?;
        let interval_nanos = duration_to_nanos(config.interval).ok_or(RateLimitError::InvalidConfig("interval must fit in i64 nanoseconds"))?;

        Ok(Self { config, interval_nanos, store, clock })
    }

    /// Create a builder for configuring a limiter
    pub fn builder() -> LimiterBuilder {
        LimiterBuilder::new()
    }

    /// Record an occurrence of `item` and decide whether it is permitted
    ///
    /// The occurrence just recorded counts toward the limit, so `limit` calls
    /// within one interval pass and the next one is rejected. Rejected calls are
    /// still recorded.
    ///
    /// # Errors
    /// Any store failure or malformed reply. An error never implies a decision.
    pub async fn pass(&self, item: &str) -> Result<bool> {
        let now = timestamp_nanos(self.clock.now())?;
        let cutoff = now.checked_sub(self.interval_nanos).ok_or(RateLimitError::TimeError)?;
        let key = self.key(item);

        let transaction = Transaction::begin()
            .queue(Command::RemoveRangeByScore { key: key.clone(), max: cutoff })
            .queue(Command::Add { key: key.clone(), score: now, member: now })
            .queue(Command::Cardinality { key });

        let replies = self.store.execute(transaction).await?;
        let count = decode_pass_replies(&replies)?;

        Ok(count <= self.config.limit)
    }

    /// Number of occurrences currently stored for `item`
    ///
    /// Read-only: nothing is pruned, so entries that expired since the last
    /// [`pass`](Limiter::pass) on this item are still counted. Unknown items yield 0.
    pub async fn peek(&self, item: &str) -> Result<i64> {
        let reply = self.store.query(Command::Cardinality { key: self.key(item) }).await?;
        let count = decode_count(&reply)?;

        Ok(count as i64)
    }

    /// Store key holding the window for `item`
    pub fn key(&self, item: &str) -> String {
        let mut key = String::with_capacity(self.config.namespace.len() + 1 + item.len());
        key.push_str(&self.config.namespace);
        key.push(KEY_SEPARATOR);
        key.push_str(item);
        key
    }

    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    pub fn limit(&self) -> u64 {
        self.config.limit
    }

    pub fn config(&self) -> &LimiterConfig {
        &self.config
    }
}

/// Replies of remove, add and count, in that order; returns the count
fn decode_pass_replies(replies: &[Reply]) -> Result<u64> {
    let [removed, added, count] = replies else {
        return Err(RateLimitError::Decode(format!("expected 3 replies, got {}", replies.len())));
    };

    for (name, reply) in [("removed count", removed), ("add result", added)] {
        if reply.as_integer().is_none() {
            return Err(RateLimitError::Decode(format!("{name} is not an integer: {reply:?}")));
        }
    }

    decode_count(count)
}

fn decode_count(reply: &Reply) -> Result<u64> {
    let value = reply.as_integer().ok_or_else(|| RateLimitError::Decode(format!("cardinality is not an integer: {reply:?}")))?;
    u64::try_from(value).map_err(|_| RateLimitError::Decode(format!("negative cardinality {value}")))
}
