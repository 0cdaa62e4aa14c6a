use std::collections::BTreeSet;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::store::Command;
use crate::store::Reply;
use crate::store::Store;
use crate::store::StoreFuture;
use crate::store::Transaction;

/// Process-local ordered-set store
///
/// Mirrors the Redis semantics the limiter relies on. A whole transaction runs
/// under one lock hold, so it is atomic with respect to every other caller
/// sharing the store. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    sets: HashMap<String, SortedSet>,
    history: Vec<Transaction>,
}

#[derive(Debug, Default)]
struct SortedSet {
    scores: HashMap<i64, i64>,
    by_score: BTreeSet<(i64, i64)>,
}

impl SortedSet {
    fn add(&mut self, score: i64, member: i64) -> i64 {
        match self.scores.insert(member, score) {
            Some(previous) => {
                self.by_score.remove(&(previous, member));
                self.by_score.insert((score, member));
                0
            }
            None => {
                self.by_score.insert((score, member));
                1
            }
        }
    }

    fn remove_up_to(&mut self, max: i64) -> i64 {
        let expired: Vec<(i64, i64)> = self.by_score.range(..=(max, i64::MAX)).copied().collect();
        for entry in &expired {
            self.by_score.remove(entry);
            self.scores.remove(&entry.1);
        }
        expired.len() as i64
    }

    fn len(&self) -> usize {
        self.scores.len()
    }
}

impl MemoryState {
    fn apply(&mut self, command: &Command) -> Reply {
        match command {
            Command::RemoveRangeByScore { key, max } => {
                let Some(set) = self.sets.get_mut(key) else {
                    return Reply::Integer(0);
                };
                let removed = set.remove_up_to(*max);
                // Redis drops keys whose set became empty
                if set.scores.is_empty() {
                    self.sets.remove(key);
                }
                Reply::Integer(removed)
            }
            Command::Add { key, score, member } => Reply::Integer(self.sets.entry(key.clone()).or_default().add(*score, *member)),
            Command::Cardinality { key } => Reply::Integer(self.sets.get(key).map_or(0, |set| set.len() as i64)),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every transaction executed so far, oldest first
    pub fn history(&self) -> Vec<Transaction> {
        self.inner.lock().history.clone()
    }

    /// Members stored under `key`, ordered by score
    pub fn members(&self, key: &str) -> Vec<i64> {
        self.inner.lock().sets.get(key).map(|set| set.by_score.iter().map(|(_, member)| *member).collect()).unwrap_or_default()
    }

    /// Drop all keys and recorded history
    pub fn clear(&self) {
        let mut state = self.inner.lock();
        state.sets.clear();
        state.history.clear();
    }
}

impl Store for MemoryStore {
    fn execute(&self, transaction: Transaction) -> StoreFuture<'_, Vec<Reply>> {
        Box::pin(async move {
            let mut state = self.inner.lock();
            let replies = transaction.commands().iter().map(|command| state.apply(command)).collect();
            state.history.push(transaction);
            Ok(replies)
        })
    }

    fn query(&self, command: Command) -> StoreFuture<'_, Reply> {
        Box::pin(async move { Ok(self.inner.lock().apply(&command)) })
    }
}
