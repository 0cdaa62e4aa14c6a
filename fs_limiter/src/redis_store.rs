//! Redis-backed ordered-set store.
//!
//! Windows live in Redis sorted sets so every process pointing at the same
//! server enforces the same limit. Transactions are sent as a `MULTI`/`EXEC`
//! pipeline and the `EXEC` array is handed back one reply per command.
//!
//! Connections come from a [`redis::aio::ConnectionManager`], which multiplexes
//! requests over one connection and reconnects on failure. The store clones the
//! manager for each call and drops the clone when the call finishes, on error
//! paths too.

use std::fmt;

use redis::Client;
use redis::Value;
use redis::aio::ConnectionManager;
use tracing::debug;
use tracing::trace;

use crate::error::Result;
use crate::store::Command;
use crate::store::Reply;
use crate::store::Store;
use crate::store::StoreFuture;
use crate::store::Transaction;

/// Sorted-set store backed by a Redis server
#[derive(Clone)]
pub struct RedisStore {
    connection_manager: ConnectionManager,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connect to Redis at `url` (e.g. `redis://127.0.0.1/`)
    ///
    /// # Errors
    /// Returns [`RateLimitError::Redis`](crate::RateLimitError::Redis) if the URL is
    /// invalid or the first connection cannot be established.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = Client::open(url)?;
        let connection_manager = client.get_connection_manager().await?;
        debug!(url, "Connected to Redis");

        Ok(Self { connection_manager })
    }

    /// Wrap an existing connection manager
    pub fn from_connection_manager(connection_manager: ConnectionManager) -> Self {
        Self { connection_manager }
    }
}

impl Store for RedisStore {
    fn execute(&self, transaction: Transaction) -> StoreFuture<'_, Vec<Reply>> {
        Box::pin(async move {
            if transaction.is_empty() {
                return Ok(Vec::new());
            }

            let mut pipe = redis::pipe();
            pipe.atomic();
            for command in transaction.commands() {
                pipe.add_command(to_redis_cmd(command));
            }

            let mut connection = self.connection_manager.clone();
            let values: Vec<Value> = pipe.query_async(&mut connection).await?;
            trace!(commands = transaction.len(), replies = values.len(), "Executed Redis transaction");

            Ok(values.into_iter().map(to_reply).collect())
        })
    }

    fn query(&self, command: Command) -> StoreFuture<'_, Reply> {
        Box::pin(async move {
            let mut connection = self.connection_manager.clone();
            let value: Value = to_redis_cmd(&command).query_async(&mut connection).await?;
            trace!(key = command.key(), "Executed Redis command");

            Ok(to_reply(value))
        })
    }
}

fn to_redis_cmd(command: &Command) -> redis::Cmd {
    match command {
        Command::RemoveRangeByScore { key, max } => {
            let mut cmd = redis::cmd("ZREMRANGEBYSCORE");
            cmd.arg(key).arg("-inf").arg(*max);
            cmd
        }
        Command::Add { key, score, member } => {
            let mut cmd = redis::cmd("ZADD");
            cmd.arg(key).arg(*score).arg(*member);
            cmd
        }
        Command::Cardinality { key } => {
            let mut cmd = redis::cmd("ZCARD");
            cmd.arg(key);
            cmd
        }
    }
}

fn to_reply(value: Value) -> Reply {
    match value {
        Value::Nil => Reply::Nil,
        Value::Int(value) => Reply::Integer(value),
        Value::BulkString(bytes) => Reply::Text(String::from_utf8_lossy(&bytes).into_owned()),
        Value::SimpleString(text) => Reply::Text(text),
        Value::Okay => Reply::Text("OK".to_string()),
        Value::Array(values) | Value::Set(values) => Reply::Array(values.into_iter().map(to_reply).collect()),
        // Anything else is unexpected for sorted-set commands; keep it visible so decoding fails loudly
        other => Reply::Text(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed(command: &Command) -> String {
        String::from_utf8_lossy(&to_redis_cmd(command).get_packed_command()).into_owned()
    }

    #[test]
    fn test_remove_range_command() {
        let cmd = packed(&Command::RemoveRangeByScore { key: "ns:foo".into(), max: 1_257_893_995_000_000_000 });
        assert_eq!(cmd, "*4\r\n$16\r\nZREMRANGEBYSCORE\r\n$6\r\nns:foo\r\n$4\r\n-inf\r\n$19\r\n1257893995000000000\r\n");
    }

    #[test]
    fn test_add_command() {
        let cmd = packed(&Command::Add { key: "ns:foo".into(), score: 42, member: 42 });
        assert_eq!(cmd, "*4\r\n$4\r\nZADD\r\n$6\r\nns:foo\r\n$2\r\n42\r\n$2\r\n42\r\n");
    }

    #[test]
    fn test_cardinality_command() {
        let cmd = packed(&Command::Cardinality { key: "ns:foo".into() });
        assert_eq!(cmd, "*2\r\n$5\r\nZCARD\r\n$6\r\nns:foo\r\n");
    }

    #[test]
    fn test_to_reply() {
        assert_eq!(to_reply(Value::Int(6)), Reply::Integer(6));
        assert_eq!(to_reply(Value::Nil), Reply::Nil);
        assert_eq!(to_reply(Value::BulkString(b"12".to_vec())), Reply::Text("12".into()));
        assert_eq!(to_reply(Value::SimpleString("QUEUED".into())), Reply::Text("QUEUED".into()));
        assert_eq!(to_reply(Value::Okay), Reply::Text("OK".into()));
        assert_eq!(
            to_reply(Value::Array(vec![Value::Int(0), Value::Int(1), Value::Int(1)])),
            Reply::Array(vec![Reply::Integer(0), Reply::Integer(1), Reply::Integer(1)])
        );
        assert_eq!(to_reply(Value::Double(1.5)).as_integer(), None);
    }
}
