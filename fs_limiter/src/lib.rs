//! # fs_limiter
//!
//! Distributed sliding-window rate limiting over a shared ordered-set store.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use fs_limiter::Limiter;
//! use fs_limiter::LimiterConfig;
//! use fs_limiter::RedisStore;
//! use fs_limiter::SystemClock;
//!
//! # async fn run() -> fs_limiter::Result<()> {
//! let store = RedisStore::connect("redis://127.0.0.1/").await?;
//! let limiter = Limiter::new(LimiterConfig::new("login", Duration::from_secs(60), 5), store, SystemClock)?;
//!
//! if !limiter.pass("alice").await? {
//!     println!("too many attempts");
//! }
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod limiter;
pub mod memory_store;
pub mod redis_store;
pub mod store;

pub use clock::Clock;
pub use clock::ManualClock;
pub use clock::SystemClock;
pub use config::LimiterBuilder;
pub use config::LimiterConfig;
pub use error::RateLimitError;
pub use error::Result;
pub use limiter::Limiter;
pub use memory_store::MemoryStore;
pub use redis_store::RedisStore;
pub use store::Command;
pub use store::Reply;
pub use store::Store;
pub use store::StoreFuture;
pub use store::Transaction;
