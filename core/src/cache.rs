//! In-memory response cache for query results.
//!
//! Entries are keyed by operation name plus the serialized variables, so the
//! same query with different variables is cached separately. Values are the
//! raw `data` object of the response.
//!
//! Every `evict` bumps the operation's epoch. A fetch reads the epoch before
//! going to the network and stores its response only if the epoch is still
//! the same, so responses requested before an eviction cannot repopulate the
//! cache after it.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    operation: &'static str,
    variables: String,
}

impl CacheKey {
    pub fn new<V: Serialize>(operation: &'static str, variables: &V) -> Result<Self, ApiError> {
        // serde_json's Map keeps keys sorted, so re-serializing through a
        // Value gives the same string regardless of struct field order.
        let value = serde_json::to_value(variables).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(Self {
            operation,
            variables: value.to_string(),
        })
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }
}

#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: HashMap<CacheKey, Value>,
    epochs: HashMap<String, u64>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: CacheKey, data: Value) {
        self.entries.insert(key, data);
    }

    pub fn epoch(&self, operation: &str) -> u64 {
        self.epochs.get(operation).copied().unwrap_or(0)
    }

    /// Store `data` only if `operation` has not been evicted since `epoch`
    /// was read. Returns whether the entry was stored.
    pub fn insert_if_current(&mut self, key: CacheKey, data: Value, epoch: u64) -> bool {
        if self.epoch(key.operation) != epoch {
            return false;
        }
        self.entries.insert(key, data);
        true
    }

    /// Drop every entry for `operation`, whatever its variables, and start a
    /// new epoch for it. Returns the number of entries removed.
    pub fn evict(&mut self, operation: &str) -> usize {
        *self.epochs.entry(operation.to_string()).or_insert(0) += 1;
        let before = self.entries.len();
        self.entries.retain(|key, _| key.operation != operation);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
