use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::Result;

/// Boxed future returned by [`Store`] operations
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Ordered-set command understood by a store
///
/// Members and scores are integer nanosecond timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Remove every member of `key` whose score lies in `(-inf, max]`
    RemoveRangeByScore { key: String, max: i64 },

    /// Add `member` to `key` with `score`, updating the score if it already exists
    Add { key: String, score: i64, member: i64 },

    /// Number of members in `key`, zero if it does not exist
    Cardinality { key: String },
}

impl Command {
    /// Key this command touches
    pub fn key(&self) -> &str {
        match self {
            Command::RemoveRangeByScore { key, .. } | Command::Add { key, .. } | Command::Cardinality { key } => key.as_str(),
        }
    }
}

/// Reply to a single command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Integer(i64),
    Text(String),
    Nil,
    Array(Vec<Reply>),
}

impl Reply {
    /// Interpret the reply as an integer
    ///
    /// Text replies holding a decimal integer are accepted, matching how Redis
    /// clients read bulk strings.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Reply::Integer(value) => Some(*value),
            Reply::Text(text) => text.parse().ok(),
            Reply::Nil | Reply::Array(_) => None,
        }
    }
}

/// Commands queued for atomic execution
///
/// Built with [`Transaction::begin`] and [`Transaction::queue`], then handed to
/// [`Store::execute`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    commands: Vec<Command>,
}

impl Transaction {
    /// Start an empty transaction
    pub fn begin() -> Self {
        Self { commands: Vec::new() }
    }

    /// Append a command; replies come back in queue order
    pub fn queue(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Networked ordered-set store backing a limiter
///
/// Implementations must run every command of a transaction as one indivisible
/// unit relative to other clients, and must return exactly one reply per command
/// in queue order or a single error. Retry and reconnection belong to the
/// implementation, not to callers.
pub trait Store: Send + Sync {
    /// Execute a transaction atomically
    fn execute(&self, transaction: Transaction) -> StoreFuture<'_, Vec<Reply>>;

    /// Execute a single command outside a transaction
    fn query(&self, command: Command) -> StoreFuture<'_, Reply>;
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn execute(&self, transaction: Transaction) -> StoreFuture<'_, Vec<Reply>> {
        (**self).execute(transaction)
    }

    fn query(&self, command: Command) -> StoreFuture<'_, Reply> {
        (**self).query(command)
    }
}
